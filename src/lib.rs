pub mod config;
pub mod editor;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod loader;
pub mod logging;
pub mod render;
pub mod scene;

pub use editor::{EditorHost, EditorSession, SessionRequest, SessionState};
pub use error::{AppError, AppResult};
pub use render::{EncodedImage, ExportFormat};

/// Opens a session for `request`, loads its base image and leaves it ready for editing.
pub async fn open_session<H: EditorHost>(
    request: SessionRequest,
    config: &config::EditorConfig,
    host: H,
) -> AppResult<EditorSession<H>> {
    let loader = loader::ImageLoader::new(config.loader_limits())?;
    let source_hint = loader::ImageSource::parse(&request.image_url).to_string();
    let mut session = EditorSession::open(request, config, host);
    if !session.load_base_image(&loader).await {
        return Err(AppError::BaseImageUnavailable { source_hint });
    }
    Ok(session)
}

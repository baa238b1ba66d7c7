use crate::editor::{EditorError, SessionStateError};
use crate::loader::LoadError;
use crate::render::{ExportError, RenderError};
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    State(#[from] SessionStateError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("base image could not be loaded from {source_hint}")]
    BaseImageUnavailable { source_hint: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_errors_convert_into_app_error() {
        let error: AppError = LoadError::UnsupportedMime("text/html".to_string()).into();
        assert!(matches!(error, AppError::Load(_)));
        assert_eq!(error.to_string(), "unsupported content type: text/html");

        let error: AppError = RenderError::Disposed.into();
        assert_eq!(error.to_string(), "render surface has been disposed");
    }
}

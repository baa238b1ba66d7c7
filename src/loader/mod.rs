//! Asynchronous image loading from URLs, data URLs and local files.
//!
//! Every payload is sniffed by signature before decoding; only raster image
//! formats are handed to the decoder.

mod source;

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbaImage;
use thiserror::Error;

pub use source::ImageSource;

pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const ACCEPTED_MIME_TYPES: [&str; 7] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/vnd.microsoft.icon",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid image source: {0}")]
    InvalidSource(String),
    #[error("unsupported content type: {0}")]
    UnsupportedMime(String),
    #[error("image payload of {size} bytes exceeds the {limit} byte limit")]
    ResourceLimit { size: u64, limit: u64 },
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderLimits {
    pub max_image_bytes: u64,
    pub request_timeout: Duration,
}

impl Default for LoaderLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A decoded raster plus the MIME type its signature matched.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: RgbaImage,
    pub mime_type: &'static str,
}

/// Returns the sniffed MIME type when `bytes` carry a supported raster signature.
pub fn sniff_raster_mime(bytes: &[u8]) -> Result<&'static str, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::UnsupportedMime("empty payload".to_string()));
    }
    let kind = infer::get(bytes)
        .ok_or_else(|| LoadError::UnsupportedMime("unrecognized signature".to_string()))?;
    let mime = kind.mime_type();
    if kind.matcher_type() != infer::MatcherType::Image || !ACCEPTED_MIME_TYPES.contains(&mime) {
        return Err(LoadError::UnsupportedMime(mime.to_string()));
    }
    Ok(mime)
}

#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
    limits: LoaderLimits,
}

impl ImageLoader {
    /// Builds the HTTP client. No cookie store is configured, so requests are
    /// sent without ambient credentials.
    pub fn new(limits: LoaderLimits) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(limits.request_timeout)
            .build()
            .map_err(|err| LoadError::Network(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, limits })
    }

    pub async fn load(&self, source: &ImageSource) -> Result<LoadedImage, LoadError> {
        tracing::debug!(kind = source.kind(), %source, "loading image");
        let bytes = self.fetch_bytes(source).await?;
        let loaded = self.decode(&bytes)?;
        tracing::debug!(
            %source,
            mime = loaded.mime_type,
            width = loaded.image.width(),
            height = loaded.image.height(),
            "image loaded"
        );
        Ok(loaded)
    }

    pub async fn fetch_bytes(&self, source: &ImageSource) -> Result<Vec<u8>, LoadError> {
        match source {
            ImageSource::Url(url) => self.download(url).await,
            ImageSource::DataUrl(data) => {
                source::decode_data_url(data, self.limits.max_image_bytes)
            }
            ImageSource::FilePath(path) => self.read_file(path).await,
        }
    }

    /// Sniffs and decodes an in-memory payload.
    pub fn decode(&self, bytes: &[u8]) -> Result<LoadedImage, LoadError> {
        self.check_size(bytes.len() as u64)?;
        let mime_type = sniff_raster_mime(bytes)?;
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(LoadedImage { image, mime_type })
    }

    fn check_size(&self, size: u64) -> Result<(), LoadError> {
        let limit = self.limits.max_image_bytes;
        if size > limit {
            return Err(LoadError::ResourceLimit { size, limit });
        }
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
        self.check_size(metadata.len())?;
        tokio::fs::read(path).await.map_err(io_error)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let url = reqwest::Url::parse(url)
            .map_err(|err| LoadError::InvalidSource(format!("malformed URL: {err}")))?;
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| LoadError::Network(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Network(format!("HTTP {}", status.as_u16())));
        }
        if let Some(length) = response.content_length() {
            self.check_size(length)?;
        }

        let mut buffer = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| LoadError::Network(err.without_url().to_string()))?
        {
            self.check_size((buffer.len() + chunk.len()) as u64)?;
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use image::{ImageFormat, Rgba};
    use std::io::{Cursor, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("png encoding should succeed");
        bytes
    }

    fn data_url(mime: &str, bytes: &[u8]) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{mime};base64,{payload}")
    }

    fn loader() -> ImageLoader {
        ImageLoader::new(LoaderLimits::default()).expect("loader should build")
    }

    fn unique_temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("thumbedit-loader-{nanos}-{name}"))
    }

    #[test]
    fn sniff_accepts_png_and_rejects_text_and_svg() {
        assert_eq!(sniff_raster_mime(&png_bytes(2, 2)).expect("png"), "image/png");
        assert!(matches!(
            sniff_raster_mime(b"hello world"),
            Err(LoadError::UnsupportedMime(_))
        ));
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"></svg>"#;
        assert!(matches!(
            sniff_raster_mime(svg),
            Err(LoadError::UnsupportedMime(_))
        ));
        assert!(matches!(sniff_raster_mime(&[]), Err(LoadError::UnsupportedMime(_))));
    }

    #[tokio::test]
    async fn loads_png_from_data_url() {
        let source = ImageSource::parse(&data_url("image/png", &png_bytes(3, 2)));
        let loaded = loader().load(&source).await.expect("data url should load");
        assert_eq!(loaded.image.dimensions(), (3, 2));
        assert_eq!(loaded.mime_type, "image/png");
        assert_eq!(loaded.image.get_pixel(0, 0).0, [200, 10, 10, 255]);
    }

    #[tokio::test]
    async fn rejects_svg_even_when_labelled_as_image() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        let source = ImageSource::parse(&data_url("image/svg+xml", svg));
        assert!(matches!(
            loader().load(&source).await,
            Err(LoadError::UnsupportedMime(_))
        ));
    }

    #[tokio::test]
    async fn loads_png_from_file_and_reports_missing_file() {
        let path = unique_temp_path("logo.png");
        std::fs::write(&path, png_bytes(4, 4)).expect("write temp png");

        let loaded = loader()
            .load(&ImageSource::FilePath(path.clone()))
            .await
            .expect("file should load");
        assert_eq!(loaded.image.dimensions(), (4, 4));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            loader().load(&ImageSource::FilePath(path)).await,
            Err(LoadError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn enforces_byte_limit_for_files() {
        let path = unique_temp_path("big.png");
        std::fs::write(&path, png_bytes(64, 64)).expect("write temp png");
        let tiny = ImageLoader::new(LoaderLimits {
            max_image_bytes: 16,
            ..LoaderLimits::default()
        })
        .expect("loader should build");

        let result = tiny.load(&ImageSource::FilePath(path.clone())).await;
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            result,
            Err(LoadError::ResourceLimit { limit: 16, .. })
        ));
    }

    #[test]
    fn decode_rejects_truncated_png() {
        let bytes = png_bytes(8, 8);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(loader().decode(truncated), Err(LoadError::Decode(_))));
    }

    #[tokio::test]
    async fn http_error_status_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let address = listener.local_addr().expect("local addr");
        let server = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0_u8; 1024];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(
                    b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                );
            }
        });

        // Bypass any proxy configured in the environment.
        let direct = ImageLoader {
            client: reqwest::Client::builder()
                .no_proxy()
                .build()
                .expect("client should build"),
            limits: LoaderLimits::default(),
        };
        let source = ImageSource::parse(&format!("http://{address}/missing.png"));
        let result = direct.load(&source).await;
        drop(server);
        match result {
            Err(LoadError::Network(message)) => assert!(message.contains("404")),
            other => panic!("expected network error, got {other:?}"),
        }
    }
}

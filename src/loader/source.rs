use std::fmt;
use std::path::PathBuf;

use base64::Engine as _;

use super::LoadError;

/// Where an image comes from, parsed from the session's image string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    DataUrl(String),
    FilePath(PathBuf),
}

impl ImageSource {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let lowered = trimmed
            .get(..8)
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| trimmed.to_ascii_lowercase());
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else if lowered.starts_with("data:") {
            Self::DataUrl(trimmed.to_string())
        } else {
            Self::FilePath(PathBuf::from(trimmed))
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::DataUrl(_) => "data-url",
            Self::FilePath(_) => "file",
        }
    }
}

impl fmt::Display for ImageSource {
    /// Query strings and inline payloads are left out; they can carry tokens or megabytes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => {
                let end = url.find(['?', '#']).unwrap_or(url.len());
                f.write_str(&url[..end])
            }
            Self::DataUrl(data) => {
                let end = data.find(',').unwrap_or(data.len());
                write!(f, "{},…", &data[..end])
            }
            Self::FilePath(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Upper bound of the decoded size of a base64 payload.
fn decoded_upper_bound(payload: &str) -> u64 {
    (payload.len() as u64).div_ceil(4) * 3
}

/// Decodes a `data:[<mime>];base64,<payload>` URL, enforcing `max_bytes` before decoding.
pub(super) fn decode_data_url(data_url: &str, max_bytes: u64) -> Result<Vec<u8>, LoadError> {
    let body = data_url
        .get(5..)
        .filter(|_| data_url[..5].eq_ignore_ascii_case("data:"))
        .ok_or_else(|| LoadError::InvalidSource("missing data: scheme".to_string()))?;
    let (header, payload) = body
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidSource("data URL has no payload".to_string()))?;
    if !header.to_ascii_lowercase().ends_with(";base64") {
        return Err(LoadError::InvalidSource(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let estimated = decoded_upper_bound(&payload);
    if estimated > max_bytes + 2 {
        return Err(LoadError::ResourceLimit {
            size: estimated,
            limit: max_bytes,
        });
    }

    base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|err| LoadError::InvalidSource(format!("invalid base64 payload: {err}")))
}

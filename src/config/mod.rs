use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::geometry::{CanvasSize, Color};
use crate::loader::{LoaderLimits, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_REQUEST_TIMEOUT};
use crate::render::{ExportFormat, DEFAULT_BACKGROUND, DEFAULT_CANVAS_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "thumbedit";
const APP_CONFIG_FILE: &str = "config.json";

pub const DEFAULT_EXPORT_MULTIPLIER: f32 = 2.0;
pub const DEFAULT_WATERMARK_TEXT: &str = "© Your Brand";

/// Editor settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: String,
    pub export_multiplier: f32,
    /// Format used when the caller does not pick one: `"png"` or `"jpeg"`.
    pub export_format: ExportFormat,
    pub watermark_text: String,
    pub font_path: Option<PathBuf>,
    pub max_image_bytes: u64,
    pub request_timeout_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_SIZE.width,
            canvas_height: DEFAULT_CANVAS_SIZE.height,
            background: "#f0f0f0".to_string(),
            export_multiplier: DEFAULT_EXPORT_MULTIPLIER,
            export_format: ExportFormat::Png,
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
            font_path: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl EditorConfig {
    pub fn canvas_size(&self) -> CanvasSize {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            tracing::warn!(
                width = self.canvas_width,
                height = self.canvas_height,
                "empty canvas size in config; using default"
            );
            return DEFAULT_CANVAS_SIZE;
        }
        CanvasSize::new(self.canvas_width, self.canvas_height)
    }

    pub fn background_color(&self) -> Color {
        Color::parse(&self.background).unwrap_or_else(|| {
            tracing::warn!(value = %self.background, "unparseable background color; using default");
            DEFAULT_BACKGROUND
        })
    }

    pub fn export_multiplier(&self) -> f32 {
        if self.export_multiplier.is_finite() && self.export_multiplier > 0.0 {
            self.export_multiplier
        } else {
            tracing::warn!(
                value = self.export_multiplier,
                "invalid export multiplier; using default"
            );
            DEFAULT_EXPORT_MULTIPLIER
        }
    }

    pub fn loader_limits(&self) -> LoaderLimits {
        LoaderLimits {
            max_image_bytes: self.max_image_bytes,
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}

pub fn load_editor_config() -> EditorConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_editor_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_editor_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EditorConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return EditorConfig::default(),
    };
    if !path.exists() {
        return EditorConfig::default();
    }
    load_editor_config_from(&path)
}

pub fn load_editor_config_from(path: &Path) -> EditorConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            EditorConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            EditorConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_root(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("thumbedit-config-{label}-{nanos}"))
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "thumbedit",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/thumbedit/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path(
            "thumbedit",
            "config.json",
            Some(Path::new("")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/thumbedit/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("thumbedit", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let root = temp_config_root("missing");
        let config = load_editor_config_with(Some(&root), None);
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.canvas_size(), CanvasSize::new(800, 450));
        assert_eq!(config.background_color(), Color::new(240, 240, 240));
        assert_eq!(config.export_multiplier(), 2.0);
        assert_eq!(config.watermark_text, "© Your Brand");
        assert_eq!(config.export_format, ExportFormat::Png);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let root = temp_config_root("partial");
        let dir = root.join(APP_DIR);
        std::fs::create_dir_all(&dir).expect("create config dir");
        std::fs::write(
            dir.join(APP_CONFIG_FILE),
            r##"{
                "canvas_width": 1280,
                "canvas_height": 720,
                "background": "#000000",
                "export_format": "jpeg",
                "request_timeout_secs": 3
            }"##,
        )
        .expect("write config");

        let config = load_editor_config_with(Some(&root), None);
        let _ = std::fs::remove_dir_all(&root);

        assert_eq!(config.canvas_size(), CanvasSize::new(1280, 720));
        assert_eq!(config.background_color(), Color::BLACK);
        assert_eq!(config.export_multiplier(), 2.0);
        assert_eq!(config.export_format, ExportFormat::Jpeg);
        assert_eq!(config.loader_limits().request_timeout, Duration::from_secs(3));
        assert_eq!(config.loader_limits().max_image_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let root = temp_config_root("malformed");
        let dir = root.join(APP_DIR);
        std::fs::create_dir_all(&dir).expect("create config dir");
        std::fs::write(dir.join(APP_CONFIG_FILE), "{ not json").expect("write config");

        let config = load_editor_config_with(Some(&root), None);
        let _ = std::fs::remove_dir_all(&root);
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn invalid_values_are_replaced_by_defaults() {
        let config = EditorConfig {
            canvas_width: 0,
            background: "not-a-color".to_string(),
            export_multiplier: -1.0,
            ..EditorConfig::default()
        };
        assert_eq!(config.canvas_size(), DEFAULT_CANVAS_SIZE);
        assert_eq!(config.background_color(), DEFAULT_BACKGROUND);
        assert_eq!(config.export_multiplier(), DEFAULT_EXPORT_MULTIPLIER);
    }
}

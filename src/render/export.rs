use std::io::Cursor;

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use serde::Deserialize;

use super::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// 0..=1, only read for lossy formats.
    pub quality: f32,
    pub multiplier: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 1.0,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn to_data_url(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{payload}", self.mime_type())
    }
}

fn jpeg_quality(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 100;
    }
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

pub(super) fn encode(
    raster: &RgbaImage,
    options: ExportOptions,
) -> Result<EncodedImage, ExportError> {
    let (width, height) = raster.dimensions();
    let mut bytes = Vec::new();
    let result = match options.format {
        ExportFormat::Png => PngEncoder::new(Cursor::new(&mut bytes)).write_image(
            raster.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut bytes), jpeg_quality(options.quality))
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|source| ExportError::Encode {
        format: options.format,
        source,
    })?;

    Ok(EncodedImage {
        bytes,
        format: options.format,
        width,
        height,
    })
}

//! Preset and adjustment filters applied to the base image layer.

mod blur;
mod color;

use image::RgbaImage;

pub use blur::{blur_sigma_for_amount, blur_with_downsample};

const ADJUSTMENT_MIN: f32 = -1.0;
const ADJUSTMENT_MAX: f32 = 1.0;
const BLUR_PERCENT_MAX: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPreset {
    #[default]
    Original,
    Vintage,
    Sepia,
    BlackWhite,
    Polaroid,
    Kodachrome,
}

impl FilterPreset {
    pub const ALL: [Self; 6] = [
        Self::Original,
        Self::Vintage,
        Self::Sepia,
        Self::BlackWhite,
        Self::Polaroid,
        Self::Kodachrome,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Vintage => "Vintage",
            Self::Sepia => "Sepia",
            Self::BlackWhite => "BlackWhite",
            Self::Polaroid => "Polaroid",
            Self::Kodachrome => "Kodachrome",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "original" | "none" => Some(Self::Original),
            "vintage" => Some(Self::Vintage),
            "sepia" => Some(Self::Sepia),
            "blackwhite" | "bw" => Some(Self::BlackWhite),
            "polaroid" => Some(Self::Polaroid),
            "kodachrome" => Some(Self::Kodachrome),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Session-wide adjustment scalars. Brightness, contrast and saturation live in
/// `[-1, 1]`; blur is a UI percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdjustmentParams {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    blur: f32,
}

impl AdjustmentParams {
    pub fn new(brightness: f32, contrast: f32, saturation: f32, blur: f32) -> Self {
        let mut params = Self::default();
        params.set_brightness(brightness);
        params.set_contrast(contrast);
        params.set_saturation(saturation);
        params.set_blur(blur);
        params
    }

    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    pub const fn contrast(&self) -> f32 {
        self.contrast
    }

    pub const fn saturation(&self) -> f32 {
        self.saturation
    }

    pub const fn blur(&self) -> f32 {
        self.blur
    }

    pub fn set_brightness(&mut self, value: f32) {
        self.brightness = clamp_adjustment(value);
    }

    pub fn set_contrast(&mut self, value: f32) {
        self.contrast = clamp_adjustment(value);
    }

    pub fn set_saturation(&mut self, value: f32) {
        self.saturation = clamp_adjustment(value);
    }

    pub fn set_blur(&mut self, value: f32) {
        self.blur = if value.is_finite() {
            value.clamp(0.0, BLUR_PERCENT_MAX)
        } else {
            0.0
        };
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

fn clamp_adjustment(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(ADJUSTMENT_MIN, ADJUSTMENT_MAX)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Preset(FilterPreset),
    Brightness(f32),
    Contrast(f32),
    Saturation(f32),
    /// Blur amount normalized to `[0, 1]`.
    Blur(f32),
}

impl FilterOp {
    pub const fn is_preset(&self) -> bool {
        matches!(self, Self::Preset(_))
    }

    fn apply(&self, image: &mut RgbaImage) {
        match *self {
            Self::Preset(preset) => color::apply_preset(image, preset),
            Self::Brightness(amount) => color::apply_brightness(image, amount),
            Self::Contrast(amount) => color::apply_contrast(image, amount),
            Self::Saturation(amount) => color::apply_saturation(image, amount),
            Self::Blur(amount) => {
                let sigma = blur_sigma_for_amount(amount, image.width(), image.height());
                if sigma > 0.0 {
                    *image = blur_with_downsample(image, sigma);
                }
            }
        }
    }
}

/// Ordered, immutable list of filter operations for the base image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterStack {
    ops: Vec<FilterOp>,
}

impl FilterStack {
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn preset(&self) -> Option<FilterPreset> {
        self.ops.iter().find_map(|op| match op {
            FilterOp::Preset(preset) => Some(*preset),
            _ => None,
        })
    }

    /// Applies every op in order to a fresh copy of `source`; `source` is never touched.
    pub fn apply(&self, source: &RgbaImage) -> RgbaImage {
        let mut output = source.clone();
        for op in &self.ops {
            op.apply(&mut output);
        }
        output
    }
}

pub fn compute_filter_stack(preset: FilterPreset, params: AdjustmentParams) -> FilterStack {
    let mut ops = Vec::with_capacity(5);
    if preset != FilterPreset::Original {
        ops.push(FilterOp::Preset(preset));
    }
    if params.brightness != 0.0 {
        ops.push(FilterOp::Brightness(params.brightness));
    }
    if params.contrast != 0.0 {
        ops.push(FilterOp::Contrast(params.contrast));
    }
    if params.saturation != 0.0 {
        ops.push(FilterOp::Saturation(params.saturation));
    }
    if params.blur > 0.0 {
        ops.push(FilterOp::Blur(params.blur / BLUR_PERCENT_MAX));
    }
    FilterStack { ops }
}

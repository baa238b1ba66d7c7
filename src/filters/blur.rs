use image::{imageops, RgbaImage};

/// Fraction of the longest image side covered by a full-strength (`1.0`) blur.
const BLUR_EXTENT_FRACTION: f32 = 0.06;
const DOWNSAMPLE_SIGMA_THRESHOLD: f32 = 6.0;
const MIN_REDUCED_SIGMA: f32 = 0.8;

/// Gaussian sigma for a normalized blur amount, relative to the image size.
pub fn blur_sigma_for_amount(amount: f32, width: u32, height: u32) -> f32 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    let longest_side = width.max(height) as f32;
    (amount.min(1.0) * BLUR_EXTENT_FRACTION * longest_side).max(0.0)
}

fn downsample_factor(width: u32, height: u32, sigma: f32) -> u32 {
    if sigma < DOWNSAMPLE_SIGMA_THRESHOLD {
        return 1;
    }
    let factor = (sigma / (DOWNSAMPLE_SIGMA_THRESHOLD / 2.0)).floor() as u32;
    factor.clamp(1, width.max(1).min(height.max(1)))
}

/// Gaussian blur that works on a reduced copy for large sigmas and scales back
/// to the original dimensions.
pub fn blur_with_downsample(image: &RgbaImage, sigma: f32) -> RgbaImage {
    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 || sigma <= 0.0 {
        return image.clone();
    }

    let downsample = downsample_factor(width, height, sigma);
    if downsample <= 1 {
        return imageops::blur(image, sigma);
    }

    let reduced_width = (width / downsample).max(1);
    let reduced_height = (height / downsample).max(1);
    let reduced = imageops::resize(
        image,
        reduced_width,
        reduced_height,
        imageops::FilterType::Triangle,
    );
    let reduced_sigma = (sigma / downsample as f32).max(MIN_REDUCED_SIGMA);
    let blurred = imageops::blur(&reduced, reduced_sigma);
    imageops::resize(&blurred, width, height, imageops::FilterType::Triangle)
}

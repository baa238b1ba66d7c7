use image::RgbaImage;

use super::FilterPreset;

/// Row-major 4x5 colour matrix; the last column is an offset in `[0, 1]` units.
type ColorMatrix = [f32; 20];

const SEPIA: ColorMatrix = [
    0.393, 0.769, 0.189, 0.0, 0.0, //
    0.349, 0.686, 0.168, 0.0, 0.0, //
    0.272, 0.534, 0.131, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const BLACK_WHITE: ColorMatrix = [
    1.5, 1.5, 1.5, 0.0, -1.0, //
    1.5, 1.5, 1.5, 0.0, -1.0, //
    1.5, 1.5, 1.5, 0.0, -1.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const VINTAGE: ColorMatrix = [
    0.627_93, 0.320_21, -0.039_65, 0.0, 0.037_84, //
    0.025_78, 0.644_11, 0.032_59, 0.0, 0.029_26, //
    0.046_6, -0.085_12, 0.524_16, 0.0, 0.020_23, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const KODACHROME: ColorMatrix = [
    1.128_55, -0.396_73, -0.039_92, 0.0, 0.249_91, //
    -0.164_04, 1.083_52, -0.054_98, 0.0, 0.096_98, //
    -0.167_86, -0.560_34, 1.601_48, 0.0, 0.139_72, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const POLAROID: ColorMatrix = [
    1.438, -0.062, -0.062, 0.0, 0.0, //
    -0.122, 1.378, -0.122, 0.0, 0.0, //
    -0.016, -0.016, 1.483, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const fn preset_matrix(preset: FilterPreset) -> Option<&'static ColorMatrix> {
    match preset {
        FilterPreset::Original => None,
        FilterPreset::Vintage => Some(&VINTAGE),
        FilterPreset::Sepia => Some(&SEPIA),
        FilterPreset::BlackWhite => Some(&BLACK_WHITE),
        FilterPreset::Polaroid => Some(&POLAROID),
        FilterPreset::Kodachrome => Some(&KODACHROME),
    }
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

pub(super) fn apply_preset(image: &mut RgbaImage, preset: FilterPreset) {
    let Some(m) = preset_matrix(preset) else {
        return;
    };
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0.map(f32::from);
        // Colour-only matrices: alpha row is identity.
        pixel.0[0] = to_channel(r * m[0] + g * m[1] + b * m[2] + a * m[3] + m[4] * 255.0);
        pixel.0[1] = to_channel(r * m[5] + g * m[6] + b * m[7] + a * m[8] + m[9] * 255.0);
        pixel.0[2] = to_channel(r * m[10] + g * m[11] + b * m[12] + a * m[13] + m[14] * 255.0);
    }
}

pub(super) fn apply_brightness(image: &mut RgbaImage, amount: f32) {
    let delta = (amount * 255.0).round();
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = to_channel(f32::from(*channel) + delta);
        }
    }
}

pub(super) fn apply_contrast(image: &mut RgbaImage, amount: f32) {
    let contrast = amount * 255.0;
    let factor = (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast));
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = to_channel(factor * (f32::from(*channel) - 128.0) + 128.0);
        }
    }
}

pub(super) fn apply_saturation(image: &mut RgbaImage, amount: f32) {
    let adjust = -amount;
    for pixel in image.pixels_mut() {
        let max = pixel.0[..3].iter().copied().max().map(f32::from).unwrap_or(0.0);
        for channel in &mut pixel.0[..3] {
            let value = f32::from(*channel);
            *channel = to_channel(value + (max - value) * adjust);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba(color))
    }

    #[test]
    fn sepia_maps_white_to_warm_tone_and_keeps_alpha() {
        let mut image = solid([255, 255, 255, 90]);
        apply_preset(&mut image, FilterPreset::Sepia);
        let pixel = image.get_pixel(0, 0).0;
        assert_eq!(pixel, [255, 255, 239, 90]);
    }

    #[test]
    fn black_white_thresholds_mid_grey_and_dark_pixels() {
        let mut image = solid([40, 40, 40, 255]);
        apply_preset(&mut image, FilterPreset::BlackWhite);
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0, 255]);

        let mut image = solid([200, 200, 200, 255]);
        apply_preset(&mut image, FilterPreset::BlackWhite);
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn original_preset_is_identity() {
        let mut image = solid([12, 34, 56, 78]);
        apply_preset(&mut image, FilterPreset::Original);
        assert_eq!(image.get_pixel(0, 0).0, [12, 34, 56, 78]);
    }

    #[test]
    fn brightness_shifts_channels_and_clamps() {
        let mut image = solid([100, 200, 250, 255]);
        apply_brightness(&mut image, 0.1);
        assert_eq!(image.get_pixel(0, 0).0, [126, 226, 255, 255]);

        apply_brightness(&mut image, -1.0);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn contrast_pushes_values_away_from_midpoint() {
        let mut image = solid([100, 128, 160, 255]);
        apply_contrast(&mut image, 0.5);
        let [r, g, b, _] = image.get_pixel(0, 0).0;
        assert!(r < 100);
        assert_eq!(g, 128);
        assert!(b > 160);
    }

    #[test]
    fn full_desaturation_collapses_to_channel_max() {
        let mut image = solid([10, 120, 200, 255]);
        apply_saturation(&mut image, -1.0);
        assert_eq!(image.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn positive_saturation_moves_channels_away_from_max() {
        let mut image = solid([100, 150, 200, 255]);
        apply_saturation(&mut image, 0.5);
        assert_eq!(image.get_pixel(0, 0).0, [50, 125, 200, 255]);
    }
}

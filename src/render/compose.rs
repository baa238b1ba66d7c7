use image::{imageops, Rgba, RgbaImage};

use crate::geometry::{CanvasPoint, Color, ObjectScale};
use crate::scene::{ImagePayload, ObjectKind, SceneGraph};

use super::FontBook;

/// Source-over blend of `color` at `alpha` (0..=1) onto `pixel`.
pub(super) fn blend_pixel(pixel: &mut Rgba<u8>, color: Color, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let dst_alpha = f32::from(pixel.0[3]) / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        pixel.0 = [0, 0, 0, 0];
        return;
    }
    let src = [color.r, color.g, color.b];
    for (channel, src_channel) in pixel.0[..3].iter_mut().zip(src) {
        let dst = f32::from(*channel) * dst_alpha;
        let blended = (f32::from(src_channel) * alpha + dst * (1.0 - alpha)) / out_alpha;
        *channel = blended.round().clamp(0.0, 255.0) as u8;
    }
    pixel.0[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn draw_image_layer(
    canvas: &mut RgbaImage,
    payload: &ImagePayload,
    position: CanvasPoint,
    scale: ObjectScale,
    multiplier: f32,
) {
    let pixels = payload.rendered();
    let target_width = (pixels.width() as f32 * scale.x * multiplier).round();
    let target_height = (pixels.height() as f32 * scale.y * multiplier).round();
    if !(target_width >= 1.0 && target_height >= 1.0) {
        return;
    }
    let left = (position.x * multiplier).round() as i64;
    let top = (position.y * multiplier).round() as i64;

    // A full resize never allocates more than the canvas and the source together;
    // bigger layers are sampled only where they cover the canvas.
    let target_area = f64::from(target_width) * f64::from(target_height);
    let resident_area = pixel_area(canvas) + pixel_area(pixels);
    if target_area > resident_area {
        sample_visible_region(canvas, pixels, (left, top), (target_width, target_height));
        return;
    }

    let target_width = target_width as u32;
    let target_height = target_height as u32;
    if (target_width, target_height) == pixels.dimensions() {
        imageops::overlay(canvas, pixels, left, top);
    } else {
        let resized = imageops::resize(
            pixels,
            target_width,
            target_height,
            imageops::FilterType::CatmullRom,
        );
        imageops::overlay(canvas, &resized, left, top);
    }
}

fn pixel_area(image: &RgbaImage) -> f64 {
    f64::from(image.width()) * f64::from(image.height())
}

/// Bilinear upsampling restricted to the canvas pixels the layer covers.
fn sample_visible_region(
    canvas: &mut RgbaImage,
    pixels: &RgbaImage,
    (left, top): (i64, i64),
    (target_width, target_height): (f32, f32),
) {
    let x_end = (left as f64 + f64::from(target_width)).min(f64::from(canvas.width())) as i64;
    let y_end = (top as f64 + f64::from(target_height)).min(f64::from(canvas.height())) as i64;
    let x_start = left.max(0);
    let y_start = top.max(0);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let step_x = f64::from(pixels.width()) / f64::from(target_width);
    let step_y = f64::from(pixels.height()) / f64::from(target_height);
    let max_u = pixels.width().saturating_sub(1) as f32;
    let max_v = pixels.height().saturating_sub(1) as f32;
    for y in y_start..y_end {
        let v = ((y as f64 - top as f64 + 0.5) * step_y - 0.5) as f32;
        let v = v.clamp(0.0, max_v);
        for x in x_start..x_end {
            let u = ((x as f64 - left as f64 + 0.5) * step_x - 0.5) as f32;
            let Some(sample) = imageops::interpolate_bilinear(pixels, u.clamp(0.0, max_u), v)
            else {
                continue;
            };
            let [r, g, b, a] = sample.0;
            blend_pixel(
                canvas.get_pixel_mut(x as u32, y as u32),
                Color::new(r, g, b),
                f32::from(a) / 255.0,
            );
        }
    }
}

/// Paints the background and every object in ascending z-order.
pub(super) fn compose_scene(
    scene: &SceneGraph,
    fonts: &FontBook,
    background: Color,
    width: u32,
    height: u32,
    multiplier: f32,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(background.rgba()));
    let mut skipped_text = 0_usize;

    for object in scene.objects() {
        match &object.kind {
            ObjectKind::BaseImage(payload) | ObjectKind::OverlayImage(payload) => {
                draw_image_layer(&mut canvas, payload, object.position, object.scale, multiplier);
            }
            ObjectKind::TextLabel(label) => {
                let drawn =
                    fonts.draw_label(&mut canvas, label, object.position, object.scale, multiplier);
                if !drawn {
                    skipped_text += 1;
                }
            }
        }
    }

    if skipped_text > 0 {
        tracing::debug!(skipped_text, "text labels skipped without a font face");
    }
    canvas
}

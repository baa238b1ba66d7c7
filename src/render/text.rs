use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use font_kit::family_name::FamilyName;
use font_kit::properties::{Properties, Weight};
use font_kit::source::SystemSource;
use image::{imageops, GrayImage, Luma, RgbaImage};

use crate::geometry::{CanvasPoint, Color, ObjectBounds, ObjectScale};
use crate::scene::{FontWeight, TextLabel};

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.16;
/// Average glyph width used when no font is loaded.
const FALLBACK_ADVANCE: f32 = 0.6;

/// Preferred families, tried before the generic sans-serif fallback.
const LABEL_FONT_FAMILIES: &[&str] = &["SF Pro Display", "Arial"];
/// Glyphs larger than this are not rasterized.
const MAX_GLYPH_PX: f32 = 4096.0;

/// Regular and bold faces used for text labels. Either may be missing.
#[derive(Clone, Default)]
pub struct FontBook {
    regular: Option<FontArc>,
    bold: Option<FontArc>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

fn load_font_file(path: &Path) -> Option<FontArc> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(?err, ?path, "font file not readable");
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(err) => {
            tracing::warn!(%err, ?path, "font file is not a usable font");
            None
        }
    }
}

/// Best system match for the label families at `weight`.
fn load_system_face(weight: Weight) -> Option<FontArc> {
    let mut families = LABEL_FONT_FAMILIES
        .iter()
        .map(|family| FamilyName::Title((*family).to_string()))
        .collect::<Vec<_>>();
    families.push(FamilyName::SansSerif);
    let properties = Properties {
        weight,
        ..Properties::new()
    };

    let handle = match SystemSource::new().select_best_match(&families, &properties) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::debug!(?err, weight = weight.0, "no system font matched");
            return None;
        }
    };
    let font = match handle.load() {
        Ok(font) => font,
        Err(err) => {
            tracing::debug!(?err, weight = weight.0, "system font failed to load");
            return None;
        }
    };
    let data = font.copy_font_data()?;
    match FontArc::try_from_vec((*data).clone()) {
        Ok(face) => {
            tracing::debug!(family = %font.family_name(), weight = weight.0, "system font selected");
            Some(face)
        }
        Err(err) => {
            tracing::warn!(%err, family = %font.family_name(), "system font is not usable");
            None
        }
    }
}

impl FontBook {
    /// A book without faces: text labels are measured by estimate and not drawn.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads `configured` for every weight when given and readable; otherwise asks
    /// the system font source for the label families at regular and bold weight.
    pub fn load(configured: Option<&Path>) -> Self {
        if let Some(face) = configured.and_then(load_font_file) {
            return Self {
                regular: Some(face),
                bold: None,
            };
        }
        let regular = load_system_face(Weight::NORMAL);
        let bold = load_system_face(Weight::BOLD);

        if regular.is_none() && bold.is_none() {
            tracing::warn!(
                configured = ?configured.map(PathBuf::from),
                "no usable font found; text labels will not be drawn"
            );
        }
        Self { regular, bold }
    }

    pub fn has_faces(&self) -> bool {
        self.regular.is_some() || self.bold.is_some()
    }

    fn face(&self, weight: FontWeight) -> Option<&FontArc> {
        match weight {
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontWeight::Normal => self.regular.as_ref().or(self.bold.as_ref()),
        }
    }

    /// Advance width of each line at `px_scale`.
    fn line_widths(&self, label: &TextLabel, px_scale: PxScale) -> Vec<f32> {
        let lines = label.text.split('\n');
        match self.face(label.weight) {
            Some(font) => {
                let scaled = font.as_scaled(px_scale);
                lines
                    .map(|line| {
                        let mut width = 0.0_f32;
                        let mut previous: Option<GlyphId> = None;
                        for ch in line.chars() {
                            let glyph = font.glyph_id(ch);
                            if let Some(previous) = previous {
                                width += scaled.kern(previous, glyph);
                            }
                            width += scaled.h_advance(glyph);
                            previous = Some(glyph);
                        }
                        width
                    })
                    .collect()
            }
            None => lines
                .map(|line| line.chars().count() as f32 * px_scale.x * FALLBACK_ADVANCE)
                .collect(),
        }
    }

    /// Canvas-space bounds of a label placed at `position` with `scale`.
    pub fn text_bounds(
        &self,
        label: &TextLabel,
        position: CanvasPoint,
        scale: ObjectScale,
    ) -> ObjectBounds {
        let px_scale = PxScale {
            x: label.font_size * scale.x,
            y: label.font_size * scale.y,
        };
        let width = self
            .line_widths(label, px_scale)
            .into_iter()
            .fold(0.0_f32, f32::max);
        let height = label.line_count() as f32 * px_scale.y * LINE_HEIGHT;
        ObjectBounds::new(position.x, position.y, width, height)
    }

    /// Draws `label` onto `canvas`. Positions and sizes are multiplied by `multiplier`.
    /// Returns `false` when no font face is available.
    pub fn draw_label(
        &self,
        canvas: &mut RgbaImage,
        label: &TextLabel,
        position: CanvasPoint,
        scale: ObjectScale,
        multiplier: f32,
    ) -> bool {
        let Some(font) = self.face(label.weight) else {
            return false;
        };

        let px_scale = PxScale {
            x: label.font_size * scale.x * multiplier,
            y: label.font_size * scale.y * multiplier,
        };
        let glyph_px = px_scale.x.max(px_scale.y);
        if !(glyph_px.is_finite() && glyph_px <= MAX_GLYPH_PX) {
            tracing::warn!(glyph_px, "text label too large to rasterize; skipped");
            return false;
        }
        let stroke_radius = label
            .stroke
            .map(|stroke| stroke.width * multiplier * scale.y / 2.0)
            .unwrap_or(0.0);
        let shadow_sigma = label
            .shadow
            .map(|shadow| shadow.blur * multiplier / 2.0)
            .unwrap_or(0.0);
        let pad = (stroke_radius + shadow_sigma * 3.0).ceil() as u32 + 2;

        let line_widths = self.line_widths(label, px_scale);
        let block_width = line_widths.iter().copied().fold(0.0_f32, f32::max);
        let line_advance = px_scale.y * LINE_HEIGHT;
        let block_height = label.line_count() as f32 * line_advance;
        let pad_px = i64::from(pad);
        let full_width = block_width.ceil() as i64 + pad_px * 2;
        let full_height = block_height.ceil() as i64 + pad_px * 2;
        let shadow_offset = label
            .shadow
            .map(|shadow| {
                (
                    (shadow.offset_x * multiplier).round() as i64,
                    (shadow.offset_y * multiplier).round() as i64,
                )
            })
            .unwrap_or((0, 0));
        let block_x = ((position.x * multiplier).round() as i64).saturating_sub(pad_px);
        let block_y = ((position.y * multiplier).round() as i64).saturating_sub(pad_px);

        // Only the part of the block that can reach the canvas is rasterized.
        let reach = pad_px + shadow_offset.0.abs().max(shadow_offset.1.abs());
        let clip_left = block_x.saturating_neg().saturating_sub(reach).max(0);
        let clip_top = block_y.saturating_neg().saturating_sub(reach).max(0);
        let clip_right = i64::from(canvas.width())
            .saturating_sub(block_x)
            .saturating_add(reach)
            .min(full_width);
        let clip_bottom = i64::from(canvas.height())
            .saturating_sub(block_y)
            .saturating_add(reach)
            .min(full_height);
        if clip_left >= clip_right || clip_top >= clip_bottom {
            return true;
        }
        let window = MaskWindow {
            left: clip_left,
            top: clip_top,
            width: (clip_right - clip_left) as u32,
            height: (clip_bottom - clip_top) as u32,
        };

        let glyph_mask =
            rasterize_lines(font, &label.text, px_scale, line_advance, pad as f32, window);
        let origin_x = block_x + clip_left;
        let origin_y = block_y + clip_top;

        let outline_mask = if stroke_radius > 0.0 {
            dilate(&glyph_mask, stroke_radius)
        } else {
            glyph_mask.clone()
        };

        if let Some(shadow) = label.shadow {
            let shadow_mask = if shadow_sigma > 0.0 {
                imageops::blur(&outline_mask, shadow_sigma)
            } else {
                outline_mask.clone()
            };
            paint_mask(
                canvas,
                &shadow_mask,
                shadow.color,
                origin_x + shadow_offset.0,
                origin_y + shadow_offset.1,
            );
        }
        if let Some(stroke) = label.stroke {
            paint_mask(canvas, &outline_mask, stroke.color, origin_x, origin_y);
        }
        paint_mask(canvas, &glyph_mask, label.fill, origin_x, origin_y);
        true
    }
}

/// Sub-rectangle of a label block, in block pixels.
#[derive(Debug, Clone, Copy)]
struct MaskWindow {
    left: i64,
    top: i64,
    width: u32,
    height: u32,
}

impl MaskWindow {
    fn misses(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> bool {
        f64::from(max_x) < self.left as f64
            || f64::from(max_y) < self.top as f64
            || f64::from(min_x) >= (self.left + i64::from(self.width)) as f64
            || f64::from(min_y) >= (self.top + i64::from(self.height)) as f64
    }
}

fn rasterize_lines(
    font: &FontArc,
    text: &str,
    px_scale: PxScale,
    line_advance: f32,
    pad: f32,
    window: MaskWindow,
) -> GrayImage {
    let scaled = font.as_scaled(px_scale);
    let ascent = scaled.ascent();
    let (width, height) = (window.width, window.height);
    let mut mask = GrayImage::new(width, height);

    for (line_index, line) in text.split('\n').enumerate() {
        let baseline = pad + line_index as f32 * line_advance + ascent;
        let mut caret = pad;
        let mut previous: Option<GlyphId> = None;
        for ch in line.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(px_scale, point(caret, baseline));
            caret += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            if window.misses(bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y) {
                continue;
            }
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + i64::from(gx) - window.left;
                let y = bounds.min.y as i64 + i64::from(gy) - window.top;
                if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                    return;
                }
                let pixel = mask.get_pixel_mut(x as u32, y as u32);
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                pixel.0[0] = pixel.0[0].max(value);
            });
        }
    }
    mask
}

/// Grows coverage outward by `radius` pixels (disc-shaped max filter).
fn dilate(mask: &GrayImage, radius: f32) -> GrayImage {
    let reach = radius.ceil() as i64;
    if reach <= 0 {
        return mask.clone();
    }
    let radius_sq = radius * radius;
    let offsets = (-reach..=reach)
        .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| ((dx * dx + dy * dy) as f32) <= radius_sq + 0.5)
        .collect::<Vec<_>>();

    let width = i64::from(mask.width());
    let height = i64::from(mask.height());
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let mut peak = 0_u8;
        for &(dx, dy) in &offsets {
            let sx = i64::from(x) + dx;
            let sy = i64::from(y) + dy;
            if sx < 0 || sy < 0 || sx >= width || sy >= height {
                continue;
            }
            peak = peak.max(mask.get_pixel(sx as u32, sy as u32).0[0]);
        }
        Luma([peak])
    })
}

fn paint_mask(
    canvas: &mut RgbaImage,
    mask: &GrayImage,
    color: Color,
    origin_x: i64,
    origin_y: i64,
) {
    let canvas_width = i64::from(canvas.width());
    let canvas_height = i64::from(canvas.height());
    for (mx, my, coverage) in mask.enumerate_pixels() {
        let coverage = coverage.0[0];
        if coverage == 0 {
            continue;
        }
        let x = origin_x + i64::from(mx);
        let y = origin_y + i64::from(my);
        if x < 0 || y < 0 || x >= canvas_width || y >= canvas_height {
            continue;
        }
        let alpha = f32::from(coverage) / 255.0 * f32::from(color.a) / 255.0;
        super::compose::blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color, alpha);
    }
}

//! Raster surface that draws a scene graph and exports the composition.

mod compose;
mod export;
mod text;

use image::RgbaImage;
use thiserror::Error;

use crate::geometry::{CanvasPoint, CanvasSize, Color, ObjectBounds};
use crate::scene::{ObjectId, ObjectKind, SceneGraph, VisualObject};

pub use export::{EncodedImage, ExportFormat, ExportOptions};
pub use text::{FontBook, LINE_HEIGHT};

pub const DEFAULT_CANVAS_SIZE: CanvasSize = CanvasSize::new(800, 450);
pub const DEFAULT_BACKGROUND: Color = Color::new(240, 240, 240);
pub const MAX_RASTER_SIDE: u32 = 16_384;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render surface has been disposed")]
    Disposed,
    #[error("resolution multiplier must be finite and positive, got {multiplier}")]
    InvalidMultiplier { multiplier: f32 },
    #[error("raster of {width}x{height} exceeds the {MAX_RASTER_SIDE}px side limit")]
    RasterTooLarge { width: u64, height: u64 },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to rasterize composition: {0}")]
    Render(#[from] RenderError),
    #[error("failed to encode {format:?} output: {source}")]
    Encode {
        format: ExportFormat,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug)]
pub struct RenderSurface {
    size: CanvasSize,
    background: Color,
    fonts: FontBook,
    frame: Option<RgbaImage>,
    disposed: bool,
}

impl RenderSurface {
    pub fn initialize(size: CanvasSize, background: Color, fonts: FontBook) -> Self {
        tracing::debug!(
            width = size.width,
            height = size.height,
            fonts = fonts.has_faces(),
            "render surface initialized"
        );
        Self {
            size,
            background,
            fonts,
            frame: None,
            disposed: false,
        }
    }

    pub const fn size(&self) -> CanvasSize {
        self.size
    }

    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Last frame produced by [`RenderSurface::render`].
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    /// Redraws the whole scene at logical size. Same scene, same pixels.
    pub fn render(&mut self, scene: &SceneGraph) -> Result<&RgbaImage, RenderError> {
        let frame = self.compose(scene, 1.0)?;
        Ok(self.frame.insert(frame))
    }

    /// Draws the scene at `multiplier` times the logical canvas size.
    pub fn compose(&self, scene: &SceneGraph, multiplier: f32) -> Result<RgbaImage, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        let (width, height) = self.scaled_dimensions(multiplier)?;
        Ok(compose::compose_scene(
            scene,
            &self.fonts,
            self.background,
            width,
            height,
            multiplier,
        ))
    }

    fn scaled_dimensions(&self, multiplier: f32) -> Result<(u32, u32), RenderError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(RenderError::InvalidMultiplier { multiplier });
        }
        let width = (f64::from(self.size.width) * f64::from(multiplier)).round() as u64;
        let height = (f64::from(self.size.height) * f64::from(multiplier)).round() as u64;
        let limit = u64::from(MAX_RASTER_SIDE);
        if width == 0 || height == 0 || width > limit || height > limit {
            return Err(RenderError::RasterTooLarge { width, height });
        }
        Ok((width as u32, height as u32))
    }

    pub fn object_bounds(&self, object: &VisualObject) -> ObjectBounds {
        match &object.kind {
            ObjectKind::BaseImage(payload) | ObjectKind::OverlayImage(payload) => {
                ObjectBounds::new(
                    object.position.x,
                    object.position.y,
                    payload.natural_width() as f32 * object.scale.x,
                    payload.natural_height() as f32 * object.scale.y,
                )
            }
            ObjectKind::TextLabel(label) => {
                self.fonts
                    .text_bounds(label, object.position, object.scale)
            }
        }
    }

    /// Topmost selectable object under `point`.
    pub fn hit_test(&self, scene: &SceneGraph, point: CanvasPoint) -> Option<ObjectId> {
        scene.topmost_selectable_at(point, |object| self.object_bounds(object))
    }

    pub fn export_raster(
        &self,
        scene: &SceneGraph,
        options: ExportOptions,
    ) -> Result<EncodedImage, ExportError> {
        let raster = self.compose(scene, options.multiplier)?;
        let encoded = export::encode(&raster, options)?;
        tracing::debug!(
            format = ?options.format,
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.bytes.len(),
            "exported raster"
        );
        Ok(encoded)
    }

    /// Releases the frame and font faces. Later render/export calls fail.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.frame = None;
        self.fonts = FontBook::empty();
        self.disposed = true;
        tracing::debug!("render surface disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn surface() -> RenderSurface {
        RenderSurface::initialize(DEFAULT_CANVAS_SIZE, DEFAULT_BACKGROUND, FontBook::empty())
    }

    fn scene_with_base(color: [u8; 4]) -> SceneGraph {
        let mut scene = SceneGraph::new();
        scene.set_base_image(
            RgbaImage::from_pixel(1920, 1080, Rgba(color)),
            DEFAULT_CANVAS_SIZE,
        );
        scene
    }

    #[test]
    fn empty_scene_renders_background_only() {
        let mut surface = surface();
        let frame = surface.render(&SceneGraph::new()).expect("render");
        assert_eq!(frame.dimensions(), (800, 450));
        assert!(frame.pixels().all(|p| p.0 == [240, 240, 240, 255]));
    }

    #[test]
    fn repeated_render_is_pixel_identical() {
        let mut scene = scene_with_base([30, 60, 90, 255]);
        scene.add_overlay_image(
            RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 200])),
            DEFAULT_CANVAS_SIZE,
        );
        let mut surface = surface();
        let first = surface.render(&scene).expect("first render").clone();
        let second = surface.render(&scene).expect("second render").clone();
        assert_eq!(first, second);
    }

    #[test]
    fn overlay_draws_above_base() {
        let mut scene = scene_with_base([0, 0, 0, 255]);
        scene.add_overlay_image(
            RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255])),
            DEFAULT_CANVAS_SIZE,
        );
        let mut surface = surface();
        let frame = surface.render(&scene).expect("render");
        // Overlay covers (680, 20) .. (700, 40) at 0.2 scale.
        assert_eq!(frame.get_pixel(690, 30).0, [255, 255, 255, 255]);
        assert_eq!(frame.get_pixel(650, 30).0, [0, 0, 0, 255]);
    }

    #[test]
    fn hit_test_skips_base_and_finds_overlay() {
        let mut scene = scene_with_base([0, 0, 0, 255]);
        let logo = scene.add_overlay_image(
            RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255])),
            DEFAULT_CANVAS_SIZE,
        );
        let surface = surface();
        assert_eq!(surface.hit_test(&scene, CanvasPoint::new(690.0, 30.0)), Some(logo));
        assert_eq!(surface.hit_test(&scene, CanvasPoint::new(400.0, 300.0)), None);
    }

    #[test]
    fn export_doubles_resolution_and_encodes_png() {
        let scene = scene_with_base([12, 34, 56, 255]);
        let surface = surface();
        let encoded = surface
            .export_raster(&scene, ExportOptions::default())
            .expect("export should succeed");
        assert_eq!((encoded.width, encoded.height), (1600, 900));
        assert_eq!(encoded.format, ExportFormat::Png);

        let decoded = image::load_from_memory(&encoded.bytes)
            .expect("png should decode")
            .to_rgba8();
        assert_eq!(decoded.dimensions(), (1600, 900));
        assert_eq!(decoded.get_pixel(800, 450).0, [12, 34, 56, 255]);
    }

    #[test]
    fn export_rejects_bad_multiplier_and_disposed_surface() {
        let scene = SceneGraph::new();
        let mut surface = surface();
        let bad = ExportOptions {
            multiplier: 0.0,
            ..ExportOptions::default()
        };
        assert!(matches!(
            surface.export_raster(&scene, bad),
            Err(ExportError::Render(RenderError::InvalidMultiplier { .. }))
        ));
        let huge = ExportOptions {
            multiplier: 100.0,
            ..ExportOptions::default()
        };
        assert!(matches!(
            surface.export_raster(&scene, huge),
            Err(ExportError::Render(RenderError::RasterTooLarge { .. }))
        ));

        surface.dispose();
        surface.dispose();
        assert!(surface.is_disposed());
        assert!(surface.frame().is_none());
        assert!(matches!(surface.render(&scene), Err(RenderError::Disposed)));
        assert!(matches!(
            surface.export_raster(&scene, ExportOptions::default()),
            Err(ExportError::Render(RenderError::Disposed))
        ));
    }
}

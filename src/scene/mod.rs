//! Layered object model: one pinned base image plus user-placed text and overlay images.

mod operations;
mod query;
mod selection;
mod text;

use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;

pub use crate::geometry::{CanvasPoint, CanvasSize, Color, ObjectScale};
pub use text::{DropShadow, FontWeight, TextLabel, TextStroke};

pub const DEFAULT_TEXT_ANCHOR: CanvasPoint = CanvasPoint::new(50.0, 50.0);
pub const WATERMARK_RIGHT_INSET: f32 = 150.0;
pub const WATERMARK_BOTTOM_INSET: f32 = 40.0;
pub const OVERLAY_RIGHT_INSET: f32 = 120.0;
pub const OVERLAY_TOP_INSET: f32 = 20.0;
pub const OVERLAY_SCALE: f32 = 0.2;
/// Largest scaled side of an image object, in canvas units.
pub const MAX_SCALED_IMAGE_SIDE: f32 = 8192.0;
/// Largest scaled font size of a text label, in canvas units.
pub const MAX_SCALED_FONT_SIZE: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decoded pixels for an image layer. `source` is never modified; `rendered`
/// holds what is drawn (the filtered copy for the base layer).
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    source: Arc<RgbaImage>,
    rendered: Arc<RgbaImage>,
}

impl ImagePayload {
    pub fn new(image: RgbaImage) -> Self {
        let source = Arc::new(image);
        Self {
            rendered: Arc::clone(&source),
            source,
        }
    }

    pub fn natural_width(&self) -> u32 {
        self.source.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.source.height()
    }

    pub fn source(&self) -> &RgbaImage {
        &self.source
    }

    pub fn rendered(&self) -> &RgbaImage {
        &self.rendered
    }

    fn set_rendered(&mut self, image: RgbaImage) {
        self.rendered = Arc::new(image);
    }

    fn restore_source(&mut self) {
        self.rendered = Arc::clone(&self.source);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKindTag {
    BaseImage,
    TextLabel,
    OverlayImage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    BaseImage(ImagePayload),
    TextLabel(TextLabel),
    OverlayImage(ImagePayload),
}

impl ObjectKind {
    pub const fn tag(&self) -> ObjectKindTag {
        match self {
            Self::BaseImage(_) => ObjectKindTag::BaseImage,
            Self::TextLabel(_) => ObjectKindTag::TextLabel,
            Self::OverlayImage(_) => ObjectKindTag::OverlayImage,
        }
    }

    pub fn as_image(&self) -> Option<&ImagePayload> {
        match self {
            Self::BaseImage(image) | Self::OverlayImage(image) => Some(image),
            Self::TextLabel(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextLabel> {
        match self {
            Self::TextLabel(text) => Some(text),
            _ => None,
        }
    }

    fn as_base_mut(&mut self) -> Option<&mut ImagePayload> {
        match self {
            Self::BaseImage(image) => Some(image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualObject {
    pub id: ObjectId,
    pub position: CanvasPoint,
    pub scale: ObjectScale,
    pub selectable: bool,
    pub kind: ObjectKind,
}

impl VisualObject {
    pub const fn tag(&self) -> ObjectKindTag {
        self.kind.tag()
    }

    pub const fn is_base_image(&self) -> bool {
        matches!(self.kind, ObjectKind::BaseImage(_))
    }

    /// Whether `scale` keeps this object within the render size limits.
    pub fn accepts_scale(&self, scale: ObjectScale) -> bool {
        if !scale.is_valid() {
            return false;
        }
        match &self.kind {
            ObjectKind::BaseImage(image) | ObjectKind::OverlayImage(image) => {
                image.natural_width() as f32 * scale.x <= MAX_SCALED_IMAGE_SIDE
                    && image.natural_height() as f32 * scale.y <= MAX_SCALED_IMAGE_SIDE
            }
            ObjectKind::TextLabel(label) => {
                label.font_size * scale.x.max(scale.y) <= MAX_SCALED_FONT_SIZE
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("object not found")]
    ObjectNotFound,
    #[error("object is not selectable")]
    NotSelectable,
    #[error("scale must be finite, positive and keep the object within the size limit")]
    InvalidScale,
}

/// Ordered object collection; index in `objects` is the z-order, 0 is the bottom.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    objects: Vec<VisualObject>,
    next_id: u64,
    active_selection: Option<ObjectId>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
            active_selection: None,
        }
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn find_index(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }

    fn find_object_mut(&mut self, id: ObjectId) -> Option<&mut VisualObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    fn push_top(&mut self, object: VisualObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        self.pin_base_to_bottom();
        id
    }

    /// Keeps the base image at index 0 whatever order the other objects are in.
    fn pin_base_to_bottom(&mut self) {
        if let Some(index) = self.objects.iter().position(VisualObject::is_base_image) {
            if index != 0 {
                let base = self.objects.remove(index);
                self.objects.insert(0, base);
            }
        }
    }

    fn base_payload_mut(&mut self) -> Option<&mut ImagePayload> {
        self.objects
            .iter_mut()
            .find_map(|object| object.kind.as_base_mut())
    }

    /// Replaces the drawn pixels of the base image; the source stays untouched.
    pub fn set_base_rendered(&mut self, image: RgbaImage) -> bool {
        match self.base_payload_mut() {
            Some(payload) => {
                payload.set_rendered(image);
                true
            }
            None => false,
        }
    }

    pub fn restore_base_source(&mut self) -> bool {
        match self.base_payload_mut() {
            Some(payload) => {
                payload.restore_source();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{Rgba, RgbaImage};

    pub(crate) fn solid_image(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }
}

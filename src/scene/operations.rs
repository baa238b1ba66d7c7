use image::RgbaImage;

use super::*;
use crate::geometry::fit_contain;

impl SceneGraph {
    /// Installs `image` as the non-selectable background, fitted and centered in `canvas`.
    /// An existing base image is replaced.
    pub fn set_base_image(&mut self, image: RgbaImage, canvas: CanvasSize) -> ObjectId {
        let (scale, position) = fit_contain(canvas, image.width(), image.height());
        self.objects.retain(|object| !object.is_base_image());

        let id = self.allocate_id();
        self.objects.insert(
            0,
            VisualObject {
                id,
                position,
                scale: ObjectScale::uniform(scale),
                selectable: false,
                kind: ObjectKind::BaseImage(ImagePayload::new(image)),
            },
        );
        tracing::debug!(%id, scale, left = position.x, top = position.y, "base image placed");
        id
    }

    /// Adds a headline label at the default anchor and selects it. Blank content is ignored.
    pub fn add_text(&mut self, content: &str, font_size: f32, color: Color) -> Option<ObjectId> {
        if content.trim().is_empty() {
            tracing::debug!("ignoring add_text with blank content");
            return None;
        }

        let id = self.allocate_id();
        self.push_top(VisualObject {
            id,
            position: DEFAULT_TEXT_ANCHOR,
            scale: ObjectScale::IDENTITY,
            selectable: true,
            kind: ObjectKind::TextLabel(TextLabel::headline(content, font_size, color)),
        });
        self.active_selection = Some(id);
        Some(id)
    }

    pub fn add_watermark(&mut self, text: &str, canvas: CanvasSize) -> ObjectId {
        let id = self.allocate_id();
        let position = CanvasPoint::new(
            canvas.width as f32 - WATERMARK_RIGHT_INSET,
            canvas.height as f32 - WATERMARK_BOTTOM_INSET,
        );
        self.push_top(VisualObject {
            id,
            position,
            scale: ObjectScale::IDENTITY,
            selectable: true,
            kind: ObjectKind::TextLabel(TextLabel::watermark(text)),
        })
    }

    /// Adds a logo near the top-right corner at a fifth of its natural size.
    pub fn add_overlay_image(&mut self, image: RgbaImage, canvas: CanvasSize) -> ObjectId {
        let id = self.allocate_id();
        let position =
            CanvasPoint::new(canvas.width as f32 - OVERLAY_RIGHT_INSET, OVERLAY_TOP_INSET);
        self.push_top(VisualObject {
            id,
            position,
            scale: ObjectScale::uniform(OVERLAY_SCALE),
            selectable: true,
            kind: ObjectKind::OverlayImage(ImagePayload::new(image)),
        })
    }

    /// Removes the active selection. Returns the removed object, or `None` when
    /// nothing removable is selected.
    pub fn delete_selected(&mut self) -> Option<VisualObject> {
        let id = self.active_selection?;
        let index = self.find_index(id);
        let Some(index) = index else {
            self.active_selection = None;
            return None;
        };
        if !self.objects[index].selectable {
            return None;
        }

        self.active_selection = None;
        let removed = self.objects.remove(index);
        self.pin_base_to_bottom();
        tracing::debug!(id = %removed.id, kind = ?removed.tag(), "deleted selected object");
        Some(removed)
    }

    /// Drops every object except the base image and clears the selection.
    pub fn reset(&mut self) {
        self.objects.retain(VisualObject::is_base_image);
        self.active_selection = None;
        self.pin_base_to_bottom();
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let index = self.find_index(id).ok_or(SceneError::ObjectNotFound)?;
        if !self.objects[index].selectable {
            return Err(SceneError::NotSelectable);
        }
        let object = self.objects.remove(index);
        self.push_top(object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::solid_image;
    use super::*;

    const CANVAS: CanvasSize = CanvasSize::new(800, 450);

    fn scene_with_base() -> (SceneGraph, ObjectId) {
        let mut scene = SceneGraph::new();
        let base = scene.set_base_image(solid_image(1920, 1080, [10, 20, 30, 255]), CANVAS);
        (scene, base)
    }

    #[test]
    fn base_image_is_fitted_centered_and_locked() {
        let (scene, base) = scene_with_base();
        let object = scene.get(base).expect("base should exist");
        assert!(!object.selectable);
        assert!((object.scale.x - 800.0 / 1920.0).abs() < 1e-6);
        assert_eq!(object.scale.x, object.scale.y);
        assert!(object.position.x.abs() < 1e-3);
        assert!(object.position.y.abs() < 1e-3);
        assert_eq!(scene.z_order_of(base), Some(0));
    }

    #[test]
    fn replacing_base_keeps_a_single_base_at_bottom() {
        let (mut scene, _) = scene_with_base();
        scene.add_text("Title", 40.0, Color::WHITE);
        let replacement = scene.set_base_image(solid_image(400, 400, [0, 0, 0, 255]), CANVAS);

        let bases = scene.objects().iter().filter(|o| o.is_base_image()).count();
        assert_eq!(bases, 1);
        assert_eq!(scene.z_order_of(replacement), Some(0));
        let object = scene.get(replacement).expect("replacement base");
        assert!((object.position.x - 175.0).abs() < 1e-3);
    }

    #[test]
    fn base_stays_at_z_zero_across_inserts() {
        let (mut scene, base) = scene_with_base();
        scene.add_text("One", 40.0, Color::WHITE);
        assert_eq!(scene.z_order_of(base), Some(0));
        scene.add_watermark("© Your Brand", CANVAS);
        assert_eq!(scene.z_order_of(base), Some(0));
        scene.add_overlay_image(solid_image(200, 100, [255, 0, 0, 255]), CANVAS);
        assert_eq!(scene.z_order_of(base), Some(0));
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn add_text_selects_new_label_at_default_anchor_on_top() {
        let (mut scene, _) = scene_with_base();
        let id = scene
            .add_text("Hello", 48.0, Color::new(255, 0, 0))
            .expect("non-empty text should be added");
        let object = scene.get(id).expect("text should exist");
        assert_eq!(object.position, DEFAULT_TEXT_ANCHOR);
        assert!(object.selectable);
        assert_eq!(scene.active_selection(), Some(id));
        assert_eq!(scene.z_order_of(id), Some(scene.len() - 1));
        let label = object.kind.as_text().expect("text payload");
        assert_eq!(label.font_size, 48.0);
        assert_eq!(label.fill, Color::new(255, 0, 0));
    }

    #[test]
    fn blank_text_leaves_graph_untouched() {
        let (mut scene, _) = scene_with_base();
        assert_eq!(scene.add_text("", 40.0, Color::WHITE), None);
        assert_eq!(scene.add_text("   ", 40.0, Color::WHITE), None);
        assert_eq!(scene.add_text("\n\t", 40.0, Color::WHITE), None);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.active_selection(), None);
    }

    #[test]
    fn watermark_anchors_bottom_right() {
        let (mut scene, _) = scene_with_base();
        let id = scene.add_watermark("© Your Brand", CANVAS);
        let object = scene.get(id).expect("watermark should exist");
        assert_eq!(object.position, CanvasPoint::new(650.0, 410.0));
        assert!(object.selectable);
        assert_eq!(scene.active_selection(), None);
    }

    #[test]
    fn overlay_anchors_top_right_at_fifth_scale() {
        let (mut scene, _) = scene_with_base();
        let id = scene.add_overlay_image(solid_image(300, 300, [0, 0, 255, 255]), CANVAS);
        let object = scene.get(id).expect("overlay should exist");
        assert_eq!(object.position, CanvasPoint::new(680.0, 20.0));
        assert_eq!(object.scale, ObjectScale::uniform(0.2));
        assert_eq!(object.tag(), ObjectKindTag::OverlayImage);
    }

    #[test]
    fn delete_selected_removes_only_selectable_selection() {
        let (mut scene, base) = scene_with_base();
        assert!(scene.delete_selected().is_none());

        let text = scene.add_text("Bye", 40.0, Color::WHITE).expect("text");
        let removed = scene.delete_selected().expect("text should be removed");
        assert_eq!(removed.id, text);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.active_selection(), None);

        // Forcing the base into the selection slot must still not delete it.
        scene.active_selection = Some(base);
        assert!(scene.delete_selected().is_none());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn reset_keeps_only_base_and_is_idempotent() {
        let (mut scene, base) = scene_with_base();
        scene.add_text("A", 40.0, Color::WHITE);
        scene.add_watermark("© Your Brand", CANVAS);
        scene.add_overlay_image(solid_image(10, 10, [0, 0, 0, 255]), CANVAS);

        scene.reset();
        let once = scene.objects().to_vec();
        scene.reset();

        assert_eq!(scene.objects(), once.as_slice());
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.z_order_of(base), Some(0));
        assert_eq!(scene.active_selection(), None);
    }

    #[test]
    fn bring_to_front_reorders_selectables_but_not_base() {
        let (mut scene, base) = scene_with_base();
        let first = scene.add_text("First", 40.0, Color::WHITE).expect("text");
        let second = scene.add_watermark("© Your Brand", CANVAS);

        scene.bring_to_front(first).expect("text can be raised");
        assert_eq!(scene.z_order_of(first), Some(2));
        assert_eq!(scene.z_order_of(second), Some(1));
        assert_eq!(scene.bring_to_front(base), Err(SceneError::NotSelectable));
        assert_eq!(scene.z_order_of(base), Some(0));
    }
}

use super::*;
use crate::geometry::ObjectBounds;

impl SceneGraph {
    /// Makes `id` the active selection. Non-selectable or unknown ids leave the
    /// current selection unchanged.
    pub fn select(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let object = self.get(id).ok_or(SceneError::ObjectNotFound)?;
        if !object.selectable {
            return Err(SceneError::NotSelectable);
        }
        self.active_selection = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) -> bool {
        self.active_selection.take().is_some()
    }

    /// Topmost selectable object whose bounds contain `point`.
    pub fn topmost_selectable_at<F>(&self, point: CanvasPoint, bounds_of: F) -> Option<ObjectId>
    where
        F: Fn(&VisualObject) -> ObjectBounds,
    {
        self.objects
            .iter()
            .rev()
            .filter(|object| object.selectable)
            .find(|object| bounds_of(object).contains(point))
            .map(|object| object.id)
    }

    pub fn move_object_by(
        &mut self,
        id: ObjectId,
        delta_x: f32,
        delta_y: f32,
    ) -> Result<(), SceneError> {
        let object = self.movable_object_mut(id)?;
        object.position = object.position.translated(delta_x, delta_y);
        Ok(())
    }

    pub fn set_object_position(
        &mut self,
        id: ObjectId,
        position: CanvasPoint,
    ) -> Result<(), SceneError> {
        let object = self.movable_object_mut(id)?;
        object.position = position;
        Ok(())
    }

    /// Rejects scales that are not positive or that would blow the object up
    /// past [`MAX_SCALED_IMAGE_SIDE`] / [`MAX_SCALED_FONT_SIZE`].
    pub fn set_object_scale(&mut self, id: ObjectId, scale: ObjectScale) -> Result<(), SceneError> {
        let object = self.movable_object_mut(id)?;
        if !object.accepts_scale(scale) {
            return Err(SceneError::InvalidScale);
        }
        object.scale = scale;
        Ok(())
    }

    fn movable_object_mut(&mut self, id: ObjectId) -> Result<&mut VisualObject, SceneError> {
        let object = self.find_object_mut(id).ok_or(SceneError::ObjectNotFound)?;
        if !object.selectable {
            return Err(SceneError::NotSelectable);
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::solid_image;
    use super::*;

    const CANVAS: CanvasSize = CanvasSize::new(800, 450);

    fn fixed_bounds(object: &VisualObject) -> ObjectBounds {
        ObjectBounds::new(object.position.x, object.position.y, 100.0, 40.0)
    }

    #[test]
    fn base_image_cannot_be_selected_moved_or_scaled() {
        let mut scene = SceneGraph::new();
        let base = scene.set_base_image(solid_image(16, 9, [0, 0, 0, 255]), CANVAS);
        let before = scene.get(base).cloned().expect("base");

        assert_eq!(scene.select(base), Err(SceneError::NotSelectable));
        assert_eq!(
            scene.move_object_by(base, 10.0, 10.0),
            Err(SceneError::NotSelectable)
        );
        assert_eq!(
            scene.set_object_scale(base, ObjectScale::uniform(2.0)),
            Err(SceneError::NotSelectable)
        );
        assert_eq!(scene.get(base), Some(&before));
        assert_eq!(scene.active_selection(), None);
    }

    #[test]
    fn move_and_scale_apply_to_selectable_objects() {
        let mut scene = SceneGraph::new();
        let id = scene.add_watermark("mark", CANVAS);
        scene.move_object_by(id, -50.0, 5.0).expect("watermark moves");
        assert_eq!(
            scene.get(id).map(|o| o.position),
            Some(CanvasPoint::new(600.0, 415.0))
        );

        scene
            .set_object_scale(id, ObjectScale::new(2.0, 0.5))
            .expect("independent axes");
        assert_eq!(
            scene.get(id).map(|o| o.scale),
            Some(ObjectScale::new(2.0, 0.5))
        );
        assert_eq!(
            scene.set_object_scale(id, ObjectScale::uniform(0.0)),
            Err(SceneError::InvalidScale)
        );
    }

    #[test]
    fn scale_limits_bound_the_rendered_size() {
        let mut scene = SceneGraph::new();
        let logo = scene.add_overlay_image(solid_image(100, 100, [255, 0, 0, 255]), CANVAS);
        assert_eq!(
            scene.set_object_scale(logo, ObjectScale::uniform(1e8)),
            Err(SceneError::InvalidScale)
        );
        assert_eq!(
            scene.set_object_scale(logo, ObjectScale::new(1.0, 82.0)),
            Err(SceneError::InvalidScale)
        );
        scene
            .set_object_scale(logo, ObjectScale::uniform(81.0))
            .expect("8100 px fits");

        let label = scene.add_text("big", 100.0, Color::WHITE).expect("text");
        assert_eq!(
            scene.set_object_scale(label, ObjectScale::new(1.0, 10.5)),
            Err(SceneError::InvalidScale)
        );
        scene
            .set_object_scale(label, ObjectScale::uniform(10.0))
            .expect("1000 px font fits");
        assert_eq!(
            scene.set_object_scale(label, ObjectScale::uniform(f32::INFINITY)),
            Err(SceneError::InvalidScale)
        );
    }

    #[test]
    fn hit_test_prefers_topmost_selectable() {
        let mut scene = SceneGraph::new();
        scene.set_base_image(solid_image(800, 450, [0, 0, 0, 255]), CANVAS);
        let lower = scene.add_text("lower", 40.0, Color::WHITE).expect("text");
        let upper = scene.add_text("upper", 40.0, Color::WHITE).expect("text");

        let hit = scene.topmost_selectable_at(CanvasPoint::new(60.0, 60.0), fixed_bounds);
        assert_eq!(hit, Some(upper));

        scene.move_object_by(upper, 300.0, 0.0).expect("move upper");
        let hit = scene.topmost_selectable_at(CanvasPoint::new(60.0, 60.0), fixed_bounds);
        assert_eq!(hit, Some(lower));

        let miss = scene.topmost_selectable_at(CanvasPoint::new(5.0, 440.0), fixed_bounds);
        assert_eq!(miss, None);
    }

    #[test]
    fn select_and_clear_selection() {
        let mut scene = SceneGraph::new();
        let mark = scene.add_watermark("mark", CANVAS);
        scene.select(mark).expect("watermark is selectable");
        assert_eq!(scene.active_selection(), Some(mark));
        assert!(scene.clear_selection());
        assert!(!scene.clear_selection());
    }
}

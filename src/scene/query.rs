use super::*;

impl SceneGraph {
    pub fn objects(&self) -> &[VisualObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&VisualObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn z_order_of(&self, id: ObjectId) -> Option<usize> {
        self.find_index(id)
    }

    pub fn base_image(&self) -> Option<&VisualObject> {
        self.objects.iter().find(|object| object.is_base_image())
    }

    pub fn active_selection(&self) -> Option<ObjectId> {
        self.active_selection
    }

    pub fn selected_object(&self) -> Option<&VisualObject> {
        self.active_selection.and_then(|id| self.get(id))
    }

    pub fn count_kind(&self, tag: ObjectKindTag) -> usize {
        self.objects
            .iter()
            .filter(|object| object.tag() == tag)
            .count()
    }
}

use std::collections::BTreeSet;

use super::ObjectId;

/// Interaction mode of the active object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Object,
    Edit,
}

/// Selected objects, the active object, the mode, and (in edit mode) the
/// selected vertices of the active object's mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Vec<ObjectId>,
    pub active: Option<ObjectId>,
    pub mode: EditMode,
    pub vertices: BTreeSet<usize>,
}

impl Selection {
    /// Selected objects in selection order.
    #[must_use]
    pub fn selected(&self) -> &[ObjectId] {
        &self.selected
    }

    /// Returns `true` if `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    /// Adds `id` to the selection.
    pub fn select(&mut self, id: ObjectId) {
        if !self.is_selected(id) {
            self.selected.push(id);
        }
    }

    /// Clears selected objects, the active object and selected vertices.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.active = None;
        self.vertices.clear();
    }

    /// Makes `id` the only selected object and the active one.
    pub fn select_only(&mut self, id: ObjectId) {
        self.clear();
        self.selected.push(id);
        self.active = Some(id);
    }

    /// Drops references to an object that no longer exists.
    pub fn forget(&mut self, id: ObjectId) {
        self.selected.retain(|&s| s != id);
        if self.active == Some(id) {
            self.active = None;
            self.vertices.clear();
        }
    }
}

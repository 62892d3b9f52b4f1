//! Scene model: objects, mesh data, selection and the material library.

pub mod object;
pub mod selection;

pub use object::{DisplayType, ObjectId, SceneObject, Transform, Visibility};
pub use selection::{EditMode, Selection};

use std::collections::BTreeSet;

use slotmap::SlotMap;
use tracing::trace;

use crate::error::SceneError;
use crate::mesh::PolyMesh;

slotmap::new_key_type! {
    /// Unique identifier for mesh data.
    pub struct MeshId;
}

/// Arena owning every object and mesh of a scene.
///
/// Objects reference meshes by [`MeshId`]; several objects may share one
/// mesh. Discovery order (insertion order) is kept separately so that
/// iteration is deterministic.
#[derive(Debug, Default, Clone)]
pub struct SceneStore {
    objects: SlotMap<ObjectId, SceneObject>,
    meshes: SlotMap<MeshId, PolyMesh>,
    order: Vec<ObjectId>,
    materials: BTreeSet<String>,
    selection: Selection,
}

impl SceneStore {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Objects ---

    /// Inserts an object and returns its ID.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = self.objects.insert(object);
        self.order.push(id);
        id
    }

    /// Removes an object. Its mesh stays until garbage collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<SceneObject, SceneError> {
        let object = self
            .objects
            .remove(id)
            .ok_or_else(|| SceneError::EntityNotFound("object".into()))?;
        self.order.retain(|&o| o != id);
        self.selection.forget(id);
        Ok(object)
    }

    /// Returns a reference to the object, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn object(&self, id: ObjectId) -> Result<&SceneObject, SceneError> {
        self.objects
            .get(id)
            .ok_or_else(|| SceneError::EntityNotFound("object".into()))
    }

    /// Returns a mutable reference to the object, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, SceneError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| SceneError::EntityNotFound("object".into()))
    }

    /// Objects in discovery order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.order
            .iter()
            .filter_map(|&id| self.objects.get(id).map(|o| (id, o)))
    }

    /// Number of objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// First object called `name`.
    #[must_use]
    pub fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.objects()
            .find(|(_, o)| o.name == name)
            .map(|(id, _)| id)
    }

    /// `base` if unused, otherwise the first free `base.001`, `base.002`, …
    #[must_use]
    pub fn unique_name(&self, base: &str) -> String {
        if self.find_object(base).is_none() {
            return base.to_owned();
        }
        (1..)
            .map(|n| format!("{base}.{n:03}"))
            .find(|candidate| self.find_object(candidate).is_none())
            .unwrap_or_else(|| base.to_owned())
    }

    // --- Meshes ---

    /// Inserts mesh data and returns its ID.
    pub fn add_mesh(&mut self, mesh: PolyMesh) -> MeshId {
        self.meshes.insert(mesh)
    }

    /// Returns a reference to the mesh, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is not found.
    pub fn mesh(&self, id: MeshId) -> Result<&PolyMesh, SceneError> {
        self.meshes
            .get(id)
            .ok_or_else(|| SceneError::EntityNotFound("mesh".into()))
    }

    /// Returns a mutable reference to the mesh, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is not found.
    pub fn mesh_mut(&mut self, id: MeshId) -> Result<&mut PolyMesh, SceneError> {
        self.meshes
            .get_mut(id)
            .ok_or_else(|| SceneError::EntityNotFound("mesh".into()))
    }

    /// Mesh ID of an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or has no mesh.
    pub fn object_mesh_id(&self, id: ObjectId) -> Result<MeshId, SceneError> {
        let object = self.object(id)?;
        object
            .mesh
            .ok_or_else(|| SceneError::MissingMesh(object.name.clone()))
    }

    /// Mesh of an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or has no mesh.
    pub fn object_mesh(&self, id: ObjectId) -> Result<&PolyMesh, SceneError> {
        self.mesh(self.object_mesh_id(id)?)
    }

    /// Mutable mesh of an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or has no mesh.
    pub fn object_mesh_mut(&mut self, id: ObjectId) -> Result<&mut PolyMesh, SceneError> {
        let mesh = self.object_mesh_id(id)?;
        self.mesh_mut(mesh)
    }

    /// Number of meshes, referenced or not.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of objects referencing `mesh`.
    #[must_use]
    pub fn mesh_users(&self, mesh: MeshId) -> usize {
        self.objects
            .values()
            .filter(|o| o.mesh == Some(mesh))
            .count()
    }

    /// Deletes every mesh no object references and returns how many were
    /// removed.
    pub fn collect_garbage(&mut self) -> usize {
        let used: BTreeSet<MeshId> = self.objects.values().filter_map(|o| o.mesh).collect();
        let before = self.meshes.len();
        self.meshes.retain(|id, _| used.contains(&id));
        let removed = before - self.meshes.len();
        if removed > 0 {
            trace!(removed, "collected orphan meshes");
        }
        removed
    }

    // --- Materials ---

    /// Registers a material name in the library.
    pub fn add_material(&mut self, name: impl Into<String>) {
        self.materials.insert(name.into());
    }

    /// Returns `true` if the library has a material called `name`.
    #[must_use]
    pub fn has_material(&self, name: &str) -> bool {
        self.materials.contains(name)
    }

    // --- Selection ---

    /// Current selection state.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable selection state.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn unique_names_get_numeric_suffixes() {
        let mut scene = SceneStore::new();
        assert_eq!(scene.unique_name("SECTOR"), "SECTOR");
        scene.add_object(SceneObject::new("SECTOR"));
        assert_eq!(scene.unique_name("SECTOR"), "SECTOR.001");
        scene.add_object(SceneObject::new("SECTOR.001"));
        assert_eq!(scene.unique_name("SECTOR"), "SECTOR.002");
    }

    #[test]
    fn objects_iterate_in_discovery_order() {
        let mut scene = SceneStore::new();
        let a = scene.add_object(SceneObject::new("a"));
        let b = scene.add_object(SceneObject::new("b"));
        let c = scene.add_object(SceneObject::new("c"));
        scene.remove_object(b).unwrap();
        let ids: Vec<_> = scene.objects().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn garbage_collection_keeps_shared_meshes() {
        let mut scene = SceneStore::new();
        let shared = scene.add_mesh(primitives::cube(2.0));
        let orphan = scene.add_mesh(primitives::plane(2.0));
        scene.add_object(SceneObject::new("a").with_mesh(shared));
        scene.add_object(SceneObject::new("b").with_mesh(shared));

        assert_eq!(scene.mesh_users(shared), 2);
        assert_eq!(scene.collect_garbage(), 1);
        assert!(scene.mesh(shared).is_ok());
        assert!(scene.mesh(orphan).is_err());
    }

    #[test]
    fn missing_mesh_is_reported_by_name() {
        let mut scene = SceneStore::new();
        let id = scene.add_object(SceneObject::new("empty"));
        assert!(matches!(
            scene.object_mesh(id),
            Err(SceneError::MissingMesh(name)) if name == "empty"
        ));
    }

    #[test]
    fn removing_active_object_clears_it_from_selection() {
        let mut scene = SceneStore::new();
        let id = scene.add_object(SceneObject::new("a"));
        scene.selection_mut().select_only(id);
        scene.remove_object(id).unwrap();
        assert!(scene.selection().active.is_none());
        assert!(scene.selection().selected().is_empty());
    }
}

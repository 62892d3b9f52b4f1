use tracing::debug;

use crate::mesh::{Face, PolyMesh};

/// Deletes every face using a named material and drops that slot.
///
/// Later slots shift down by one and face indices are updated to match.
#[derive(Debug, Clone)]
pub struct RemoveMaterialFaces {
    name: String,
}

impl RemoveMaterialFaces {
    /// Creates a removal for the material called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Removes faces in place and returns how many were deleted. A name not
    /// present in the slots removes nothing.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        let Some(slot) = mesh.materials().position(&self.name) else {
            return 0;
        };
        let offsets = mesh.corner_offsets();
        let mut faces = Vec::with_capacity(mesh.face_count());
        let mut sources = Vec::with_capacity(mesh.corner_count());
        for (index, face) in mesh.faces().iter().enumerate() {
            if face.material == slot {
                continue;
            }
            let material = if face.material > slot {
                face.material - 1
            } else {
                face.material
            };
            faces.push(Face {
                corners: face.corners.clone(),
                material,
            });
            sources.extend(offsets[index]..offsets[index] + face.len());
        }
        let removed = mesh.face_count() - faces.len();
        let positions = mesh.positions().to_vec();
        mesh.rebuild(positions, faces, &sources);
        mesh.materials_mut().remove(slot);
        debug!(material = %self.name, removed, "removed material faces");
        removed
    }
}

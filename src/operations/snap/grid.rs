use tracing::debug;

use crate::error::{ContextError, OperationError, Result};
use crate::math::{transform_point, Matrix4, Point3, Vector3};
use crate::mesh::PolyMesh;
use crate::scene::{EditMode, SceneStore};

/// Displacements at or below this do not count as a move.
pub const MOVE_EPSILON: f64 = 1e-6;

/// Snaps vertices to a world-space grid.
///
/// Each vertex is taken to world space, every axis is rounded to the nearest
/// multiple of its step (axes with a step of zero or less are left alone),
/// and the result is taken back to local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSnap {
    steps: Vector3,
}

impl GridSnap {
    /// Creates a snap with per-axis steps.
    #[must_use]
    pub fn new(steps: Vector3) -> Self {
        Self { steps }
    }

    /// Creates a snap with the same step on every axis.
    #[must_use]
    pub fn uniform(step: f64) -> Self {
        Self::new(Vector3::new(step, step, step))
    }

    /// Snaps a single world-space point.
    #[must_use]
    pub fn snap_point(&self, point: &Point3) -> Point3 {
        let mut snapped = *point;
        for axis in 0..3 {
            let step = self.steps[axis];
            if step > 0.0 {
                snapped[axis] = (point[axis] / step).round() * step;
            }
        }
        snapped
    }

    /// Snaps every vertex of `mesh`, whose local-to-world matrix is
    /// `to_world`, and returns the number of vertices moved.
    ///
    /// # Errors
    ///
    /// Returns an error if `to_world` cannot be inverted.
    pub fn execute(&self, mesh: &mut PolyMesh, to_world: &Matrix4) -> Result<usize> {
        let all: Vec<usize> = (0..mesh.vertex_count()).collect();
        self.execute_vertices(mesh, to_world, &all)
    }

    /// Snaps the listed vertices only.
    ///
    /// # Errors
    ///
    /// Returns an error if `to_world` cannot be inverted.
    pub fn execute_vertices(
        &self,
        mesh: &mut PolyMesh,
        to_world: &Matrix4,
        vertices: &[usize],
    ) -> Result<usize> {
        let to_local = to_world.try_inverse().ok_or_else(|| {
            OperationError::InvalidInput("object transform is not invertible".into())
        })?;
        let positions = mesh.positions_mut();
        let mut moved = 0;
        for &index in vertices {
            let Some(p) = positions.get_mut(index) else {
                continue;
            };
            let world = transform_point(to_world, p);
            let local = transform_point(&to_local, &self.snap_point(&world));
            if (local - *p).norm() > MOVE_EPSILON {
                *p = local;
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Snaps the selected vertices of the active object.
    ///
    /// # Errors
    ///
    /// Rejects with a [`ContextError`] outside edit mode or without an
    /// active mesh object; fails if the object transform is singular.
    pub fn execute_selection(&self, scene: &mut SceneStore) -> Result<usize> {
        let selection = scene.selection();
        if selection.mode != EditMode::Edit {
            return Err(ContextError::NotInEditMode("grid snap").into());
        }
        let active = selection.active.ok_or(ContextError::NoActiveObject)?;
        let vertices: Vec<usize> = selection.vertices.iter().copied().collect();
        let object = scene.object(active)?;
        let to_world = object.transform.matrix();
        let Some(mesh_id) = object.mesh else {
            return Err(ContextError::NotAMesh(object.name.clone()).into());
        };
        let moved = self.execute_vertices(scene.mesh_mut(mesh_id)?, &to_world, &vertices)?;
        debug!(moved, "snapped selection to grid");
        Ok(moved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::BrushworkError;
    use crate::mesh::{primitives, Face};
    use crate::scene::{SceneObject, Transform};
    use approx::assert_relative_eq;

    fn scattered() -> PolyMesh {
        let positions = vec![
            Point3::new(0.26, 0.74, -0.49),
            Point3::new(1.9, 2.1, 0.0),
            Point3::new(-3.3, 0.5, 4.49),
        ];
        PolyMesh::from_parts(positions, vec![Face::from_vertices(&[0, 1, 2], 0)])
    }

    #[test]
    fn snaps_each_axis_to_its_step() {
        let snap = GridSnap::new(Vector3::new(0.5, 1.0, 0.0));
        let p = snap.snap_point(&Point3::new(0.26, 0.74, -0.49));
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, 1.0);
        assert_relative_eq!(p.z, -0.49);
    }

    #[test]
    fn second_pass_moves_nothing() {
        let mut mesh = scattered();
        let to_world = Transform::from_location(Vector3::new(0.3, -0.2, 0.1))
            .with_scale(Vector3::new(2.0, 0.5, 1.0))
            .matrix();
        let snap = GridSnap::uniform(0.25);
        assert!(snap.execute(&mut mesh, &to_world).unwrap() > 0);
        assert_eq!(snap.execute(&mut mesh, &to_world).unwrap(), 0);
    }

    #[test]
    fn snaps_in_world_space() {
        let mut mesh = scattered();
        let to_world = Matrix4::new_translation(&Vector3::new(0.25, 0.0, 0.0));
        GridSnap::uniform(1.0).execute(&mut mesh, &to_world).unwrap();
        // 0.26 + 0.25 = 0.51 -> 1.0 in world, 0.75 locally.
        assert_relative_eq!(mesh.positions()[0].x, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn selection_snap_requires_edit_mode() {
        let mut scene = SceneStore::new();
        let mesh = scene.add_mesh(primitives::cube(2.0));
        let id = scene.add_object(SceneObject::new("box").with_mesh(mesh));
        scene.selection_mut().select_only(id);

        let err = GridSnap::uniform(1.0).execute_selection(&mut scene).unwrap_err();
        assert!(matches!(
            err,
            BrushworkError::Context(ContextError::NotInEditMode(_))
        ));
    }

    #[test]
    fn selection_snap_moves_selected_vertices_only() {
        let mut scene = SceneStore::new();
        let mesh = scene.add_mesh(scattered());
        let id = scene.add_object(SceneObject::new("tri").with_mesh(mesh));
        let selection = scene.selection_mut();
        selection.select_only(id);
        selection.mode = EditMode::Edit;
        selection.vertices.insert(1);

        let moved = GridSnap::uniform(1.0).execute_selection(&mut scene).unwrap();
        assert_eq!(moved, 1);
        let positions = scene.mesh(mesh).unwrap().positions();
        assert_relative_eq!(positions[1].x, 2.0);
        assert_relative_eq!(positions[0].x, 0.26);
    }
}

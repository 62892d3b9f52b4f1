use std::collections::BTreeSet;

use tracing::debug;

use super::GridSnap;
use crate::config::LiveSnapConfig;
use crate::error::Result;
use crate::math::{transform_point, Point3};
use crate::scene::{EditMode, MeshId, ObjectId, SceneStore};

/// Snap-while-editing observer.
///
/// The host calls [`LiveSnap::on_update`] after each change notification.
/// When the watched world positions differ from the last call, the
/// selection is snapped to the grid and the snapped positions become the
/// new watch list. In edit mode only the selected vertices of the active
/// object are snapped; in object mode every vertex of each selected object.
#[derive(Debug, Clone)]
pub struct LiveSnap {
    snap: GridSnap,
    watched: Vec<Point3>,
}

struct Target {
    object: ObjectId,
    mesh: MeshId,
    vertices: Option<Vec<usize>>,
}

impl LiveSnap {
    /// Creates an observer with the given grid.
    #[must_use]
    pub fn new(snap: GridSnap) -> Self {
        Self {
            snap,
            watched: Vec::new(),
        }
    }

    /// Creates an observer from configuration, or `None` when disabled.
    #[must_use]
    pub fn from_config(config: &LiveSnapConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(GridSnap::new(config.grid())))
    }

    /// Handles one change notification and returns the number of vertices
    /// moved.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected object's transform is singular or its
    /// mesh is missing.
    pub fn on_update(&mut self, scene: &mut SceneStore) -> Result<usize> {
        let targets = targets(scene);
        let current = watched_positions(scene, &targets)?;
        if current == self.watched {
            return Ok(0);
        }

        let mut moved = 0;
        for target in &targets {
            let to_world = scene.object(target.object)?.transform.matrix();
            let mesh = scene.mesh_mut(target.mesh)?;
            moved += match &target.vertices {
                Some(vertices) => self.snap.execute_vertices(mesh, &to_world, vertices)?,
                None => self.snap.execute(mesh, &to_world)?,
            };
        }
        self.watched = watched_positions(scene, &targets)?;
        if moved > 0 {
            debug!(moved, "live snap");
        }
        Ok(moved)
    }
}

fn targets(scene: &SceneStore) -> Vec<Target> {
    let selection = scene.selection();
    if selection.mode == EditMode::Edit {
        return selection
            .active
            .and_then(|id| {
                let mesh = scene.object(id).ok()?.mesh?;
                Some(Target {
                    object: id,
                    mesh,
                    vertices: Some(selection.vertices.iter().copied().collect()),
                })
            })
            .into_iter()
            .collect();
    }
    let mut seen = BTreeSet::new();
    selection
        .selected()
        .iter()
        .filter_map(|&id| {
            let mesh = scene.object(id).ok()?.mesh?;
            seen.insert(mesh).then_some(Target {
                object: id,
                mesh,
                vertices: None,
            })
        })
        .collect()
}

fn watched_positions(scene: &SceneStore, targets: &[Target]) -> Result<Vec<Point3>> {
    let mut positions = Vec::new();
    for target in targets {
        let to_world = scene.object(target.object)?.transform.matrix();
        let mesh = scene.mesh(target.mesh)?;
        match &target.vertices {
            Some(vertices) => positions.extend(
                vertices
                    .iter()
                    .filter_map(|&v| mesh.positions().get(v))
                    .map(|p| transform_point(&to_world, p)),
            ),
            None => positions.extend(
                mesh.positions()
                    .iter()
                    .map(|p| transform_point(&to_world, p)),
            ),
        }
    }
    Ok(positions)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::mesh::primitives;
    use crate::scene::{SceneObject, Transform};

    fn scene_with_cube(location: Vector3) -> (SceneStore, ObjectId, MeshId) {
        let mut scene = SceneStore::new();
        let mesh = scene.add_mesh(primitives::cube(1.3));
        let id = scene.add_object(
            SceneObject::new("box")
                .with_mesh(mesh)
                .with_transform(Transform::from_location(location)),
        );
        scene.selection_mut().select_only(id);
        (scene, id, mesh)
    }

    #[test]
    fn disabled_config_yields_no_observer() {
        assert!(LiveSnap::from_config(&LiveSnapConfig::default()).is_none());
    }

    #[test]
    fn snaps_once_until_something_moves() {
        let (mut scene, id, mesh) = scene_with_cube(Vector3::zeros());
        let mut live = LiveSnap::new(GridSnap::uniform(1.0));

        assert_eq!(live.on_update(&mut scene).unwrap(), 8);
        assert_eq!(live.on_update(&mut scene).unwrap(), 0);

        scene.mesh_mut(mesh).unwrap().positions_mut()[0].x = -0.7;
        assert_eq!(live.on_update(&mut scene).unwrap(), 1);

        scene.object_mut(id).unwrap().transform.location.x = 0.25;
        assert_eq!(live.on_update(&mut scene).unwrap(), 8);
    }

    #[test]
    fn edit_mode_snaps_selected_vertices() {
        let (mut scene, _, mesh) = scene_with_cube(Vector3::zeros());
        let selection = scene.selection_mut();
        selection.mode = EditMode::Edit;
        selection.vertices.insert(6);
        let mut live = LiveSnap::new(GridSnap::uniform(1.0));

        assert_eq!(live.on_update(&mut scene).unwrap(), 1);
        let positions = scene.mesh(mesh).unwrap().positions();
        assert!((positions[6].x - 1.0).abs() < 1e-12);
        assert!((positions[0].x + 0.65).abs() < 1e-12);
    }
}

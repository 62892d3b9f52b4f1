//! Post-build cleanup of the level mesh.

use tracing::debug;

use crate::capabilities::HostCapabilities;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::mesh::PolyMesh;
use crate::operations::cleanup::{
    FlipNormals, LimitedDissolve, MergeByDistance, RecalculateNormals, RemoveMaterialFaces,
};
use crate::operations::snap::{GridSnap, RoundPrecision};
use crate::scene::Transform;

/// Weld distance used to close boolean seams.
pub const SEAM_MERGE_DISTANCE: f64 = 1e-5;

/// What the finalize pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeStats {
    pub merged_vertices: usize,
    pub dissolved_faces: usize,
    pub snapped_vertices: usize,
    pub removed_faces: usize,
    pub flipped_faces: usize,
}

/// Cleans up a finished level mesh in place.
///
/// Runs, in order: seam merge, optional limited dissolve, optional
/// post-build grid snap, removal of faces using the configured material,
/// rounding of vertices and the level origin, and inward normal
/// orientation.
#[derive(Debug, Clone, Copy)]
pub struct Finalize<'a> {
    config: &'a BuildConfig,
    capabilities: &'a HostCapabilities,
}

impl<'a> Finalize<'a> {
    #[must_use]
    pub fn new(config: &'a BuildConfig, capabilities: &'a HostCapabilities) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    /// Finalizes `mesh`, placed by `transform`.
    ///
    /// # Errors
    ///
    /// Returns an error if post-build snapping is on and `transform` cannot
    /// be inverted.
    pub fn execute(&self, mesh: &mut PolyMesh, transform: &mut Transform) -> Result<FinalizeStats> {
        let config = self.config;
        let mut stats = FinalizeStats {
            merged_vertices: MergeByDistance::new(SEAM_MERGE_DISTANCE).execute(mesh),
            ..FinalizeStats::default()
        };

        if config.dissolve.enabled && self.capabilities.limited_dissolve {
            stats.dissolved_faces =
                LimitedDissolve::new(config.dissolve.angle_degrees.to_radians()).execute(mesh);
        }
        if config.post_build_snap.enabled {
            stats.snapped_vertices =
                GridSnap::uniform(config.post_build_snap.step).execute(mesh, &transform.matrix())?;
        }
        if let Some(name) = config.removal_target() {
            stats.removed_faces = RemoveMaterialFaces::new(name).execute(mesh);
        }

        RoundPrecision::new(config.map_precision).execute(mesh);
        transform.round_location(config.map_precision);

        stats.flipped_faces = if self.capabilities.consistent_normals {
            RecalculateNormals::inside().execute(mesh)
        } else {
            FlipNormals::new().execute(mesh)
        };

        debug!(?stats, "finalized level mesh");
        Ok(stats)
    }
}

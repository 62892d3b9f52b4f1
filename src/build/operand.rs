//! Boolean operand preparation.

use tracing::trace;

use crate::brush::BrushEntry;
use crate::capabilities::HostCapabilities;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::math::Matrix4;
use crate::mesh::{ensure_color_layer, PolyMesh};
use crate::operations::cleanup::{MergeByDistance, Triangulate};
use crate::operations::snap::RoundPrecision;
use crate::operations::texture::AutoTexture;

/// Weld distance applied to operands before they reach the solver.
pub const OPERAND_MERGE_DISTANCE: f64 = 1e-6;

/// Turns a brush's base mesh into an object-space boolean operand.
///
/// The brush is evaluated (sectors get their shell), inflated around its
/// own origin when overlap assist is on, triangulated, welded, rounded,
/// auto-textured if the brush asks for it, and given the shared color
/// layer. The base mesh is never modified.
#[derive(Debug, Clone, Copy)]
pub struct PrepareOperand<'a> {
    entry: &'a BrushEntry,
    config: &'a BuildConfig,
    capabilities: &'a HostCapabilities,
}

impl<'a> PrepareOperand<'a> {
    /// Creates a preparation for one brush.
    #[must_use]
    pub fn new(
        entry: &'a BrushEntry,
        config: &'a BuildConfig,
        capabilities: &'a HostCapabilities,
    ) -> Self {
        Self {
            entry,
            config,
            capabilities,
        }
    }

    /// Builds the operand from `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the brush cannot be evaluated (for example a
    /// sector whose footprint has no faces).
    pub fn execute(&self, base: &PolyMesh) -> Result<PolyMesh> {
        let brush = &self.entry.brush;
        let mut mesh = brush.evaluate(base)?;

        let factor = self.config.boolean_overlap.factor();
        if (factor - 1.0).abs() > f64::EPSILON {
            mesh.transform(&Matrix4::new_scaling(factor));
        }
        let triangulated = Triangulate::new().execute(&mut mesh);
        let merged = MergeByDistance::new(OPERAND_MERGE_DISTANCE).execute(&mut mesh);
        RoundPrecision::new(self.config.map_precision).execute(&mut mesh);

        if brush.auto_texture {
            AutoTexture::from_transform(&self.entry.transform, brush.mapping).execute(&mut mesh);
        }
        ensure_color_layer(
            &mut mesh,
            &self.config.color_attribute_name,
            self.capabilities,
        );

        trace!(
            brush = %self.entry.name,
            faces = mesh.face_count(),
            triangulated,
            merged,
            "prepared operand"
        );
        Ok(mesh)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::brush::{Brush, BrushKind};
    use crate::math::Vector3;
    use crate::mesh::primitives;
    use crate::scene::{MeshId, ObjectId, Transform};
    use approx::assert_relative_eq;

    fn entry(kind: BrushKind) -> BrushEntry {
        BrushEntry {
            id: ObjectId::default(),
            name: "BRUSH".into(),
            transform: Transform::identity(),
            brush: Brush::new(kind),
            mesh: MeshId::default(),
        }
    }

    #[test]
    fn brush_operand_is_triangulated_and_colored() {
        let entry = entry(BrushKind::Brush);
        let config = BuildConfig::default();
        let caps = HostCapabilities::default();
        let base = primitives::cube(2.0);

        let operand = PrepareOperand::new(&entry, &config, &caps)
            .execute(&base)
            .unwrap();
        assert_eq!(operand.face_count(), 12);
        assert!(operand.faces().iter().all(|f| f.len() == 3));
        assert_eq!(operand.colors().active().unwrap().name(), "Attribute");
        assert!(base.colors().is_empty());
        assert_eq!(base.face_count(), 6);
    }

    #[test]
    fn sector_operand_spans_floor_to_ceiling() {
        let entry = entry(BrushKind::Sector);
        let operand = PrepareOperand::new(&entry, &BuildConfig::default(), &HostCapabilities::default())
            .execute(&primitives::plane(2.0))
            .unwrap();
        let (min, max) = operand.bounds().unwrap();
        assert_relative_eq!(min.z, 0.0);
        assert_relative_eq!(max.z, 4.0);
    }

    #[test]
    fn overlap_inflates_around_the_origin() {
        let entry = entry(BrushKind::Brush);
        let mut config = BuildConfig::default();
        config.boolean_overlap.enabled = true;
        config.boolean_overlap.epsilon = 0.01;

        let operand = PrepareOperand::new(&entry, &config, &HostCapabilities::default())
            .execute(&primitives::cube(2.0))
            .unwrap();
        let (min, max) = operand.bounds().unwrap();
        assert_relative_eq!(max.x, 1.01);
        assert_relative_eq!(min.z, -1.01);
    }

    #[test]
    fn auto_texture_projects_with_the_object_placement() {
        let mut entry = entry(BrushKind::Brush);
        entry.transform = Transform::from_location(Vector3::new(10.0, 0.0, 0.0));
        let operand = PrepareOperand::new(&entry, &BuildConfig::default(), &HostCapabilities::default())
            .execute(&primitives::cube(2.0))
            .unwrap();
        let top = (0..operand.face_count())
            .find(|&f| operand.face_normal(f).is_some_and(|n| n.z > 0.9))
            .unwrap();
        let face = &operand.faces()[top];
        let points = operand.face_points(top);
        for (corner, point) in face.corners.iter().zip(&points) {
            assert_relative_eq!(corner.uv.x, point.x + 10.0);
            assert_relative_eq!(corner.uv.y, point.y);
        }
    }

    #[test]
    fn color_layer_is_skipped_without_host_support() {
        let entry = entry(BrushKind::Brush);
        let operand = PrepareOperand::new(&entry, &BuildConfig::default(), &HostCapabilities::minimal())
            .execute(&primitives::cube(2.0))
            .unwrap();
        assert!(operand.colors().is_empty());
    }

    #[test]
    fn empty_sector_footprint_fails() {
        let entry = entry(BrushKind::Sector);
        let result = PrepareOperand::new(&entry, &BuildConfig::default(), &HostCapabilities::default())
            .execute(&PolyMesh::new());
        assert!(result.is_err());
    }
}

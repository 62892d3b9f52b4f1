//! Sector shelling: turn a footprint into a closed room volume.

use std::collections::HashMap;

use tracing::trace;

use crate::error::OperationError;
use crate::math::polygon_3d::newell_normal;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::mesh::{Corner, Face, PolyMesh};

/// Offset used when the thickness is zero.
const DEFAULT_OFFSET: f64 = -1.0;

/// Thickness and offset of a solidify shell.
///
/// The footprint layer ends up at `thickness * (offset + 1) / 2` along the
/// vertex normals, the copied layer at `thickness * (offset - 1) / 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellParams {
    pub thickness: f64,
    pub offset: f64,
}

impl ShellParams {
    /// Displacement of the footprint layer.
    #[must_use]
    pub fn footprint_offset(&self) -> f64 {
        self.thickness * (self.offset + 1.0) * 0.5
    }

    /// Displacement of the copied layer.
    #[must_use]
    pub fn copy_offset(&self) -> f64 {
        self.thickness * (self.offset - 1.0) * 0.5
    }
}

/// Shell parameters placing the footprint at `ceiling` and its copy at
/// `floor`.
///
/// A negative thickness (ceiling below floor) yields an inside-out shell.
#[must_use]
pub fn compute_shell(floor: f64, ceiling: f64) -> ShellParams {
    let thickness = ceiling - floor;
    let offset = if thickness == 0.0 {
        DEFAULT_OFFSET
    } else {
        1.0 + floor / (thickness / 2.0)
    };
    ShellParams { thickness, offset }
}

/// Extrudes a surface into a shell along its vertex normals.
///
/// Footprint faces keep their material slot, copied faces use slot + 1 and
/// rim faces slot + 2, clamped to the last existing slot.
#[derive(Debug, Clone, Copy)]
pub struct Solidify {
    params: ShellParams,
    material_offset: usize,
    rim_material_offset: usize,
}

impl Solidify {
    /// Creates a solidify operation with sector material offsets.
    #[must_use]
    pub fn new(params: ShellParams) -> Self {
        Self {
            params,
            material_offset: 1,
            rim_material_offset: 2,
        }
    }

    /// Builds the shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the footprint has no faces.
    pub fn execute(&self, footprint: &PolyMesh) -> Result<PolyMesh, OperationError> {
        if footprint.is_empty() {
            return Err(OperationError::InvalidInput(
                "cannot shell a footprint without faces".into(),
            ));
        }
        let n = footprint.vertex_count();
        let normals = vertex_normals(footprint);
        let top = self.params.footprint_offset();
        let bottom = self.params.copy_offset();

        let mut positions = Vec::with_capacity(n * 2);
        positions.extend(
            footprint
                .positions()
                .iter()
                .zip(&normals)
                .map(|(p, normal)| p + normal * top),
        );
        positions.extend(
            footprint
                .positions()
                .iter()
                .zip(&normals)
                .map(|(p, normal)| p + normal * bottom),
        );

        let last_slot = footprint.materials().len().checked_sub(1);
        let clamp = |m: usize| last_slot.map_or(m, |last| m.min(last));

        let offsets = footprint.corner_offsets();
        let boundary = boundary_edges(footprint);
        let mut faces = Vec::new();
        let mut sources = Vec::new();

        for (index, face) in footprint.faces().iter().enumerate() {
            let start = offsets[index];
            faces.push(face.clone());
            sources.extend(start..start + face.len());
        }

        for (index, face) in footprint.faces().iter().enumerate() {
            let start = offsets[index];
            let corners = face
                .corners
                .iter()
                .rev()
                .map(|c| Corner::with_uv(c.vertex + n, c.uv))
                .collect();
            faces.push(Face {
                corners,
                material: clamp(face.material + self.material_offset),
            });
            sources.extend((0..face.len()).rev().map(|i| start + i));
        }

        for (index, face) in footprint.faces().iter().enumerate() {
            let start = offsets[index];
            let len = face.len();
            for i in 0..len {
                let j = (i + 1) % len;
                let (a, b) = (face.corners[i], face.corners[j]);
                if !boundary.contains_key(&edge_key(a.vertex, b.vertex)) {
                    continue;
                }
                faces.push(Face {
                    corners: vec![
                        Corner::with_uv(b.vertex, b.uv),
                        Corner::with_uv(a.vertex, a.uv),
                        Corner::with_uv(a.vertex + n, a.uv),
                        Corner::with_uv(b.vertex + n, b.uv),
                    ],
                    material: clamp(face.material + self.rim_material_offset),
                });
                sources.extend([start + j, start + i, start + i, start + j]);
            }
        }

        trace!(
            thickness = self.params.thickness,
            offset = self.params.offset,
            faces = faces.len(),
            "solidified footprint"
        );
        Ok(footprint.derive(positions, faces, &sources))
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Undirected edges used by exactly one face.
fn boundary_edges(mesh: &PolyMesh) -> HashMap<(usize, usize), usize> {
    let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
    for face in mesh.faces() {
        let len = face.len();
        for i in 0..len {
            let key = edge_key(face.corners[i].vertex, face.corners[(i + 1) % len].vertex);
            *counts.entry(key).or_default() += 1;
        }
    }
    counts.retain(|_, count| *count == 1);
    counts
}

/// Area-weighted vertex normals; isolated vertices get +Z.
fn vertex_normals(mesh: &PolyMesh) -> Vec<Vector3> {
    let mut sums = vec![Vector3::zeros(); mesh.vertex_count()];
    for face in mesh.faces() {
        let points: Vec<Point3> = face
            .corners
            .iter()
            .filter_map(|c| mesh.positions().get(c.vertex).copied())
            .collect();
        let normal = newell_normal(&points);
        for corner in &face.corners {
            if let Some(sum) = sums.get_mut(corner.vertex) {
                *sum += normal;
            }
        }
    }
    sums.into_iter()
        .map(|sum| {
            let len = sum.norm();
            if len < TOLERANCE {
                Vector3::z()
            } else {
                sum / len
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_3d::polygon_centroid;
    use crate::mesh::{primitives, MaterialSlots};
    use approx::assert_relative_eq;

    fn sector_footprint() -> PolyMesh {
        let mut mesh = primitives::plane(2.0);
        *mesh.materials_mut() = MaterialSlots::from_names(vec![
            Some("ceiling".into()),
            Some("floor".into()),
            Some("wall".into()),
        ]);
        mesh
    }

    #[test]
    fn default_room_heights() {
        let shell = compute_shell(0.0, 4.0);
        assert_relative_eq!(shell.thickness, 4.0);
        assert_relative_eq!(shell.offset, 1.0);
        assert_relative_eq!(shell.footprint_offset(), 4.0);
        assert_relative_eq!(shell.copy_offset(), 0.0);
    }

    #[test]
    fn raised_floor() {
        let shell = compute_shell(1.0, 3.0);
        assert_relative_eq!(shell.thickness, 2.0);
        assert_relative_eq!(shell.offset, 2.0);
        assert_relative_eq!(shell.footprint_offset(), 3.0);
        assert_relative_eq!(shell.copy_offset(), 1.0);
    }

    #[test]
    fn zero_thickness_keeps_default_offset() {
        let shell = compute_shell(2.0, 2.0);
        assert_relative_eq!(shell.thickness, 0.0);
        assert_relative_eq!(shell.offset, -1.0);
    }

    #[test]
    fn shell_is_a_closed_outward_box() {
        let mesh = Solidify::new(compute_shell(0.0, 4.0))
            .execute(&sector_footprint())
            .unwrap();
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertex_count(), 8);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.z, 0.0);
        assert_relative_eq!(max.z, 4.0);

        let center = Point3::new(0.0, 0.0, 2.0);
        for face in 0..mesh.face_count() {
            let n = mesh.face_normal(face).unwrap();
            let c = polygon_centroid(&mesh.face_points(face));
            assert!(n.dot(&(c - center)) > 0.0, "face {face} points inward");
        }
    }

    #[test]
    fn layers_use_ceiling_floor_wall_slots() {
        let mesh = Solidify::new(compute_shell(0.0, 4.0))
            .execute(&sector_footprint())
            .unwrap();
        let materials: Vec<usize> = mesh.faces().iter().map(|f| f.material).collect();
        assert_eq!(materials, vec![0, 1, 2, 2, 2, 2]);
        let top = mesh.face_normal(0).unwrap();
        assert_relative_eq!(top.z, 1.0);
    }

    #[test]
    fn negative_thickness_turns_inside_out() {
        let mesh = Solidify::new(compute_shell(4.0, 0.0))
            .execute(&sector_footprint())
            .unwrap();
        let top = mesh.face_normal(0).unwrap();
        let c = polygon_centroid(&mesh.face_points(0));
        assert_relative_eq!(c.z, 0.0);
        assert_relative_eq!(top.z, 1.0);
        // The footprint layer is now the lowest one but still faces up.
        let (_, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.z, 4.0);
    }

    #[test]
    fn empty_footprint_is_rejected() {
        assert!(Solidify::new(compute_shell(0.0, 4.0))
            .execute(&PolyMesh::new())
            .is_err());
    }
}

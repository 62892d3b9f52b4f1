use std::collections::HashMap;

use tracing::trace;

use crate::math::Point3;
use crate::mesh::{Corner, Face, PolyMesh};

/// Welds vertices closer than a distance.
///
/// Vertices are visited in index order and each one collapses onto the
/// lowest-indexed earlier survivor within range, so the result does not
/// depend on hashing order. Faces left with fewer than three distinct
/// corners are removed.
#[derive(Debug, Clone, Copy)]
pub struct MergeByDistance {
    distance: f64,
}

impl MergeByDistance {
    /// Creates a merge with the given distance threshold.
    #[must_use]
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }

    /// Merges in place and returns the number of vertices removed.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        if self.distance.is_nan() || self.distance <= 0.0 || mesh.vertex_count() == 0 {
            return 0;
        }
        let remap = self.cluster(mesh.positions());

        let mut new_index = vec![usize::MAX; remap.len()];
        let mut positions = Vec::new();
        for (vertex, &target) in remap.iter().enumerate() {
            if target == vertex {
                new_index[vertex] = positions.len();
                positions.push(mesh.positions()[vertex]);
            }
        }
        let removed = mesh.vertex_count() - positions.len();

        let offsets = mesh.corner_offsets();
        let mut faces = Vec::with_capacity(mesh.face_count());
        let mut sources = Vec::with_capacity(mesh.corner_count());
        for (index, face) in mesh.faces().iter().enumerate() {
            let start = offsets[index];
            let mut corners = Vec::with_capacity(face.len());
            let mut corner_sources = Vec::with_capacity(face.len());
            for (k, corner) in face.corners.iter().enumerate() {
                let mut corner = *corner;
                corner.vertex = new_index[remap[corner.vertex]];
                if corners.last().is_some_and(|c: &Corner| c.vertex == corner.vertex) {
                    continue;
                }
                corners.push(corner);
                corner_sources.push(start + k);
            }
            while corners.len() > 1
                && corners.first().map(|c| c.vertex) == corners.last().map(|c| c.vertex)
            {
                corners.pop();
                corner_sources.pop();
            }
            let mut distinct: Vec<usize> = corners.iter().map(|c| c.vertex).collect();
            distinct.sort_unstable();
            distinct.dedup();
            if distinct.len() < 3 {
                continue;
            }
            faces.push(Face {
                corners,
                material: face.material,
            });
            sources.extend(corner_sources);
        }

        if removed > 0 {
            trace!(removed, distance = self.distance, "merged vertices");
        }
        mesh.rebuild(positions, faces, &sources);
        removed
    }

    /// For every vertex, the index of the vertex it merges into (itself for
    /// survivors).
    fn cluster(&self, positions: &[Point3]) -> Vec<usize> {
        let cell = |p: &Point3| -> (i64, i64, i64) {
            #[allow(clippy::cast_possible_truncation)]
            let key = |c: f64| (c / self.distance).floor() as i64;
            (key(p.x), key(p.y), key(p.z))
        };
        let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        let mut remap = Vec::with_capacity(positions.len());

        for (index, p) in positions.iter().enumerate() {
            let (cx, cy, cz) = cell(p);
            let mut best: Option<usize> = None;
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                            continue;
                        };
                        for &other in bucket {
                            if (positions[other] - p).norm() <= self.distance {
                                best = Some(best.map_or(other, |b| b.min(other)));
                            }
                        }
                    }
                }
            }
            match best {
                Some(target) => remap.push(target),
                None => {
                    grid.entry((cx, cy, cz)).or_default().push(index);
                    remap.push(index);
                }
            }
        }
        remap
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use crate::operations::cleanup::Triangulate;

    #[test]
    fn split_quads_weld_back_together() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0 + 1e-7, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0 - 1e-7, 0.0),
        ];
        let faces = vec![
            Face::from_vertices(&[0, 1, 2, 3], 0),
            Face::from_vertices(&[4, 5, 6, 7], 0),
        ];
        let mut mesh = PolyMesh::from_parts(positions, faces);
        assert_eq!(MergeByDistance::new(1e-6).execute(&mut mesh), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.faces()[1].corners[0].vertex, 1);
        assert_eq!(mesh.faces()[1].corners[3].vertex, 2);
    }

    #[test]
    fn collapsed_faces_are_dropped() {
        let mut mesh = primitives::cube(1e-9);
        Triangulate::new().execute(&mut mesh);
        MergeByDistance::new(1e-6).execute(&mut mesh);
        assert_eq!(mesh.vertex_count(), 1);
        assert!(mesh.is_empty());
    }

    #[test]
    fn non_positive_distance_is_a_no_op() {
        let mut mesh = primitives::cube(2.0);
        assert_eq!(MergeByDistance::new(0.0).execute(&mut mesh), 0);
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn color_layers_stay_aligned() {
        let mut mesh = primitives::cube(2.0);
        let corners = mesh.corner_count();
        mesh.colors_mut().add("Col", corners, crate::mesh::WHITE);
        MergeByDistance::new(1e-4).execute(&mut mesh);
        assert_eq!(mesh.colors().layers()[0].values().len(), mesh.corner_count());
    }
}

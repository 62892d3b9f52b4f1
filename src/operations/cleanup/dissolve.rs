use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use crate::mesh::{Face, PolyMesh};

/// Merges neighbouring faces that are nearly coplanar.
///
/// Two faces merge when they share exactly one edge, traverse it in
/// opposite directions, use the same material slot, and their normals
/// differ by at most the angle. Merging repeats until nothing changes.
#[derive(Debug, Clone, Copy)]
pub struct LimitedDissolve {
    angle: f64,
}

impl LimitedDissolve {
    /// Creates a dissolve with a threshold angle in radians.
    #[must_use]
    pub fn new(angle: f64) -> Self {
        Self { angle }
    }

    /// Dissolves in place and returns the number of faces removed.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        let mut total = 0;
        loop {
            let merged = self.pass(mesh);
            if merged == 0 {
                break;
            }
            total += merged;
        }
        if total > 0 {
            trace!(removed = total, "dissolved coplanar faces");
        }
        total
    }

    fn pass(&self, mesh: &mut PolyMesh) -> usize {
        let cos_limit = self.angle.cos();
        let normals: Vec<_> = (0..mesh.face_count()).map(|f| mesh.face_normal(f)).collect();
        let offsets = mesh.corner_offsets();

        let mut edges: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (index, face) in mesh.faces().iter().enumerate() {
            for (a, b) in face_edges(face) {
                edges.entry(edge_key(a, b)).or_default().push(index);
            }
        }

        let faces = mesh.faces();
        let mut consumed = vec![false; faces.len()];
        let mut replacement: HashMap<usize, (Face, Vec<usize>)> = HashMap::new();

        for f in 0..faces.len() {
            if consumed[f] {
                continue;
            }
            let Some(nf) = normals[f] else { continue };
            let face = &faces[f];
            for (i, (a, b)) in face_edges(face).enumerate() {
                let Some(users) = edges.get(&edge_key(a, b)) else {
                    continue;
                };
                let [x, y] = users.as_slice() else { continue };
                let g = if *x == f { *y } else { *x };
                if g == f || consumed[g] || faces[g].material != face.material {
                    continue;
                }
                let Some(ng) = normals[g] else { continue };
                if nf.dot(&ng) < cos_limit {
                    continue;
                }
                let other = &faces[g];
                let Some(m) = face_edges(other).position(|e| e == (b, a)) else {
                    continue;
                };
                if !touch_only_at(face, other, a, b) {
                    continue;
                }

                let (lf, lg) = (face.len(), other.len());
                let mut corners = Vec::with_capacity(lf + lg - 2);
                let mut sources = Vec::with_capacity(lf + lg - 2);
                for k in 0..lf {
                    let idx = (i + 1 + k) % lf;
                    corners.push(face.corners[idx]);
                    sources.push(offsets[f] + idx);
                }
                for k in 0..lg - 2 {
                    let idx = (m + 2 + k) % lg;
                    corners.push(other.corners[idx]);
                    sources.push(offsets[g] + idx);
                }
                consumed[f] = true;
                consumed[g] = true;
                replacement.insert(
                    f,
                    (
                        Face {
                            corners,
                            material: face.material,
                        },
                        sources,
                    ),
                );
                break;
            }
        }

        let merged = replacement.len();
        if merged == 0 {
            return 0;
        }

        let mut new_faces = Vec::with_capacity(faces.len() - merged);
        let mut sources = Vec::with_capacity(mesh.corner_count());
        for (index, face) in faces.iter().enumerate() {
            if let Some((merged_face, merged_sources)) = replacement.remove(&index) {
                new_faces.push(merged_face);
                sources.extend(merged_sources);
            } else if !consumed[index] {
                new_faces.push(face.clone());
                sources.extend(offsets[index]..offsets[index] + face.len());
            }
        }
        let positions = mesh.positions().to_vec();
        mesh.rebuild(positions, new_faces, &sources);
        merged
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Directed edges of a face in corner order.
fn face_edges(face: &Face) -> impl Iterator<Item = (usize, usize)> + '_ {
    let len = face.len();
    (0..len).map(move |i| (face.corners[i].vertex, face.corners[(i + 1) % len].vertex))
}

/// Faces share no vertex other than the edge `a`-`b`.
fn touch_only_at(f: &Face, g: &Face, a: usize, b: usize) -> bool {
    let fv: BTreeSet<usize> = f.corners.iter().map(|c| c.vertex).collect();
    g.corners
        .iter()
        .map(|c| c.vertex)
        .filter(|v| *v != a && *v != b)
        .all(|v| !fv.contains(&v))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::mesh::primitives;

    fn two_quads(second_z: f64, second_material: usize) -> PolyMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, second_z),
            Point3::new(2.0, 1.0, second_z),
        ];
        PolyMesh::from_parts(
            positions,
            vec![
                Face::from_vertices(&[0, 1, 2, 3], 0),
                Face::from_vertices(&[1, 4, 5, 2], second_material),
            ],
        )
    }

    #[test]
    fn coplanar_neighbours_merge() {
        let mut mesh = two_quads(0.0, 0);
        assert_eq!(LimitedDissolve::new(5f64.to_radians()).execute(&mut mesh), 1);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.faces()[0].len(), 6);
        assert!((mesh.face_area(0) - 2.0).abs() < 1e-9);
        assert!(mesh.face_normal(0).unwrap().z > 0.99);
    }

    #[test]
    fn different_materials_stay_apart() {
        let mut mesh = two_quads(0.0, 1);
        assert_eq!(LimitedDissolve::new(5f64.to_radians()).execute(&mut mesh), 0);
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn steep_fold_stays_apart() {
        let mut mesh = two_quads(1.0, 0);
        assert_eq!(LimitedDissolve::new(5f64.to_radians()).execute(&mut mesh), 0);
    }

    #[test]
    fn cube_keeps_its_sides() {
        let mut mesh = primitives::cube(2.0);
        assert_eq!(LimitedDissolve::new(5f64.to_radians()).execute(&mut mesh), 0);
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn triangulated_cube_folds_back_to_quads() {
        let mut mesh = primitives::cube(2.0);
        crate::operations::cleanup::Triangulate::new().execute(&mut mesh);
        LimitedDissolve::new(1f64.to_radians()).execute(&mut mesh);
        assert_eq!(mesh.face_count(), 6);
    }
}

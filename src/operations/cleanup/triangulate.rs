use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedFaceHandle;
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::trace;

use crate::math::polygon_3d::{plane_basis, polygon_normal};
use crate::math::{Point3, Vector3};
use crate::mesh::{Face, PolyMesh};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Splits every face into triangles, keeping corner UVs and colors.
///
/// Triangles pass through, convex quads are cut along their shorter
/// diagonal, and everything else goes through a constrained Delaunay
/// triangulation of the face projected onto its own plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct Triangulate;

impl Triangulate {
    /// Creates a triangulation operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Triangulates `mesh` in place and returns the resulting face count.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        let offsets = mesh.corner_offsets();
        let mut faces = Vec::with_capacity(mesh.face_count() * 2);
        let mut sources = Vec::with_capacity(mesh.corner_count() * 2);

        for (index, face) in mesh.faces().iter().enumerate() {
            let start = offsets[index];
            let points = mesh.face_points(index);
            if points.len() != face.len() {
                continue;
            }
            for tri in split_face(&points) {
                faces.push(Face {
                    corners: tri.iter().map(|&i| face.corners[i]).collect(),
                    material: face.material,
                });
                sources.extend(tri.iter().map(|&i| start + i));
            }
        }

        let count = faces.len();
        trace!(before = mesh.face_count(), after = count, "triangulated");
        let positions = mesh.positions().to_vec();
        mesh.rebuild(positions, faces, &sources);
        count
    }
}

/// Triangles of one polygon as local corner indices.
fn split_face(points: &[Point3]) -> Vec<[usize; 3]> {
    match points.len() {
        0..=2 => Vec::new(),
        3 => vec![[0, 1, 2]],
        n => {
            let Some(normal) = polygon_normal(points) else {
                return fan(n);
            };
            if n == 4 && is_convex(points, &normal) {
                if (points[0] - points[2]).norm() <= (points[1] - points[3]).norm() {
                    vec![[0, 1, 2], [0, 2, 3]]
                } else {
                    vec![[1, 2, 3], [1, 3, 0]]
                }
            } else {
                triangulate_polygon(points, &normal).unwrap_or_else(|_| fan(n))
            }
        }
    }
}

fn fan(n: usize) -> Vec<[usize; 3]> {
    (1..n - 1).map(|i| [0, i, i + 1]).collect()
}

fn is_convex(points: &[Point3], normal: &Vector3) -> bool {
    let n = points.len();
    (0..n).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        (b - a).cross(&(c - b)).dot(normal) > 0.0
    })
}

/// Constrained Delaunay triangulation of a planar loop.
fn triangulate_polygon(
    points: &[Point3],
    normal: &Vector3,
) -> Result<Vec<[usize; 3]>, InsertionError> {
    let (u, v) = plane_basis(normal);
    let origin = points[0];
    let mut cdt = Cdt::new();
    let mut handles = Vec::with_capacity(points.len());
    let mut corner_of: HashMap<usize, usize> = HashMap::new();

    for (corner, p) in points.iter().enumerate() {
        let d = p - origin;
        let handle = cdt.insert(SpadePoint2::new(d.dot(&u), d.dot(&v)))?;
        corner_of.entry(handle.index()).or_insert(corner);
        handles.push(handle);
    }
    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to && cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        }
    }

    let interior = classify_interior_faces(&cdt);
    let mut triangles = Vec::new();
    for face in cdt.inner_faces() {
        if !interior.contains(&face.fix().index()) {
            continue;
        }
        let vertices = face.vertices();
        let mut tri = [0usize; 3];
        for (slot, vertex) in tri.iter_mut().zip(vertices.iter()) {
            match corner_of.get(&vertex.fix().index()) {
                Some(&corner) => *slot = corner,
                None => return Ok(fan(points.len())),
            }
        }
        triangles.push(tri);
    }
    if triangles.is_empty() {
        return Ok(fan(points.len()));
    }
    Ok(triangles)
}

/// Inner CDT faces inside the constraint loop, by crossing-depth parity.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, u32)> = VecDeque::new();
    let outer = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let index = inner.fix().index();
            if depth_map.contains_key(&index) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(index, depth);
            if depth % 2 == 1 {
                interior.insert(index);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face, depth)) = queue.pop_front() {
        for edge in cdt.face(face).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let index = neighbor.fix().index();
            if depth_map.contains_key(&index) {
                continue;
            }
            let next = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(index, next);
            if next % 2 == 1 {
                interior.insert(index);
            }
            queue.push_back((neighbor.fix(), next));
        }
    }

    interior
}

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::math::Point3;
use crate::mesh::{Face, PolyMesh};

/// Which side consistent normals should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalSide {
    Outside,
    Inside,
}

/// Makes face winding consistent across each connected piece, then turns
/// every closed piece to face the requested side.
///
/// Orientation spreads across manifold edges (edges with exactly two
/// faces); the side of a piece comes from the sign of its enclosed volume.
/// Pieces that enclose no volume keep the orientation of their first face.
#[derive(Debug, Clone, Copy)]
pub struct RecalculateNormals {
    side: NormalSide,
}

impl RecalculateNormals {
    /// Normals pointing out of closed volumes.
    #[must_use]
    pub fn outside() -> Self {
        Self {
            side: NormalSide::Outside,
        }
    }

    /// Normals pointing into closed volumes.
    #[must_use]
    pub fn inside() -> Self {
        Self {
            side: NormalSide::Inside,
        }
    }

    /// Reorients in place and returns the number of faces flipped.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        let faces = mesh.faces();
        let mut edges: HashMap<(usize, usize), Vec<(usize, bool)>> = HashMap::new();
        for (index, face) in faces.iter().enumerate() {
            for (a, b) in directed_edges(face) {
                let forward = a < b;
                edges
                    .entry(if forward { (a, b) } else { (b, a) })
                    .or_default()
                    .push((index, forward));
            }
        }

        let mut flip = vec![false; faces.len()];
        let mut visited = vec![false; faces.len()];
        for seed in 0..faces.len() {
            if visited[seed] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([seed]);
            visited[seed] = true;
            while let Some(f) = queue.pop_front() {
                component.push(f);
                for (a, b) in directed_edges(&faces[f]) {
                    let key = if a < b { (a, b) } else { (b, a) };
                    let Some(users) = edges.get(&key) else {
                        continue;
                    };
                    if users.len() != 2 {
                        continue;
                    }
                    let forward_f = (a < b) != flip[f];
                    for &(g, forward_g) in users {
                        if g == f || visited[g] {
                            continue;
                        }
                        // The neighbour must run the shared edge the other way.
                        flip[g] = forward_g == forward_f;
                        visited[g] = true;
                        queue.push_back(g);
                    }
                }
            }

            let volume: f64 = component
                .iter()
                .map(|&f| {
                    let v = signed_volume(mesh.positions(), &faces[f]);
                    if flip[f] {
                        -v
                    } else {
                        v
                    }
                })
                .sum();
            let points_out = volume > 0.0;
            let wants_out = self.side == NormalSide::Outside;
            if volume.abs() > f64::EPSILON && points_out != wants_out {
                for &f in &component {
                    flip[f] = !flip[f];
                }
            }
        }

        let flipped = flip.iter().filter(|&&f| f).count();
        if flipped > 0 {
            trace!(flipped, side = ?self.side, "reoriented normals");
            mesh.reverse_faces(&flip);
        }
        flipped
    }
}

/// Reverses the winding of every face.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlipNormals;

impl FlipNormals {
    /// Creates a flip operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Flips in place and returns the number of faces flipped.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        let count = mesh.face_count();
        mesh.reverse_faces(&vec![true; count]);
        count
    }
}

fn directed_edges(face: &Face) -> impl Iterator<Item = (usize, usize)> + '_ {
    let len = face.len();
    (0..len).map(move |i| (face.corners[i].vertex, face.corners[(i + 1) % len].vertex))
}

/// Signed volume of the cone from the origin over a face (fan-triangulated).
fn signed_volume(positions: &[Point3], face: &Face) -> f64 {
    let Some(first) = face.corners.first().and_then(|c| positions.get(c.vertex)) else {
        return 0.0;
    };
    let mut volume = 0.0;
    for window in face.corners[1..].windows(2) {
        let (Some(b), Some(c)) = (positions.get(window[0].vertex), positions.get(window[1].vertex))
        else {
            continue;
        };
        volume += first.coords.dot(&b.coords.cross(&c.coords)) / 6.0;
    }
    volume
}

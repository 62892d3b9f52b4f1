//! Polygons and splitting planes for the BSP solver.

use crate::math::polygon_3d::{newell_normal, polygon_centroid};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::mesh::Rgba;

/// Distance below which a point counts as lying on a plane.
pub(super) const EPSILON: f64 = 1e-5;

/// A polygon corner with the attributes carried through splits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Vertex {
    pub pos: Point3,
    pub uv: Point2,
    pub color: Rgba,
}

impl Vertex {
    /// Linear blend towards `other`; `t = 0` is `self`.
    pub fn interpolate(&self, other: &Self, t: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let tf = t as f32;
        let mut color = self.color;
        for (c, o) in color.iter_mut().zip(other.color) {
            *c += (o - *c) * tf;
        }
        Self {
            pos: self.pos + (other.pos - self.pos) * t,
            uv: self.uv + (other.uv - self.uv) * t,
            color,
        }
    }
}

/// Side of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Coplanar = 0,
    Front = 1,
    Back = 2,
    Spanning = 3,
}

impl Side {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Coplanar,
            1 => Self::Front,
            2 => Self::Back,
            _ => Self::Spanning,
        }
    }
}

/// Oriented plane `normal · p = w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Plane {
    pub normal: Vector3,
    pub w: f64,
}

impl Plane {
    /// Best-fit plane of a loop, or `None` when the loop has no area.
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let normal = newell_normal(points);
        let len = normal.norm();
        if len < TOLERANCE {
            return None;
        }
        let normal = normal / len;
        let w = normal.dot(&polygon_centroid(points).coords);
        Some(Self { normal, w })
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.w
    }

    fn side_of(&self, point: &Point3) -> Side {
        let d = self.signed_distance(point);
        if d < -EPSILON {
            Side::Back
        } else if d > EPSILON {
            Side::Front
        } else {
            Side::Coplanar
        }
    }

    /// Sorts `polygon` into the four output lists, splitting it when it
    /// straddles the plane.
    pub fn split(
        &self,
        polygon: Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let sides: Vec<Side> = polygon
            .vertices
            .iter()
            .map(|v| self.side_of(&v.pos))
            .collect();
        let kind = Side::from_bits(sides.iter().fold(0u8, |acc, s| acc | *s as u8));

        match kind {
            Side::Coplanar => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon);
                } else {
                    coplanar_back.push(polygon);
                }
            }
            Side::Front => front.push(polygon),
            Side::Back => back.push(polygon),
            Side::Spanning => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (si, sj) = (sides[i], sides[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if si != Side::Back {
                        f.push(*vi);
                    }
                    if si != Side::Front {
                        b.push(*vi);
                    }
                    if (si as u8 | sj as u8) == Side::Spanning as u8 {
                        let denom = self.normal.dot(&(vj.pos - vi.pos));
                        let t = (self.w - self.normal.dot(&vi.pos.coords)) / denom;
                        let v = vi.interpolate(vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    front.push(polygon.with_vertices(f));
                }
                if b.len() >= 3 {
                    back.push(polygon.with_vertices(b));
                }
            }
        }
    }
}

/// Convex or concave planar polygon with a material slot.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Polygon {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,
    pub material: usize,
}

impl Polygon {
    /// Creates a polygon, or `None` when it is degenerate.
    pub fn new(vertices: Vec<Vertex>, material: usize) -> Option<Self> {
        let points: Vec<Point3> = vertices.iter().map(|v| v.pos).collect();
        let plane = Plane::from_points(&points)?;
        Some(Self {
            vertices,
            plane,
            material,
        })
    }

    /// A fragment of this polygon sharing its plane and material.
    fn with_vertices(&self, vertices: Vec<Vertex>) -> Self {
        Self {
            vertices,
            plane: self.plane,
            material: self.material,
        }
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::WHITE;

    fn v(x: f64, y: f64, z: f64) -> Vertex {
        Vertex {
            pos: Point3::new(x, y, z),
            uv: Point2::new(x, y),
            color: WHITE,
        }
    }

    fn split(plane: &Plane, polygon: Polygon) -> [Vec<Polygon>; 4] {
        let mut out: [Vec<Polygon>; 4] = Default::default();
        let [cf, cb, f, b] = &mut out;
        plane.split(polygon, cf, cb, f, b);
        out
    }

    #[test]
    fn spanning_square_splits_in_two() {
        let square = Polygon::new(
            vec![
                v(-1.0, -1.0, 0.0),
                v(1.0, -1.0, 0.0),
                v(1.0, 1.0, 0.0),
                v(-1.0, 1.0, 0.0),
            ],
            3,
        )
        .unwrap();
        let plane = Plane {
            normal: Vector3::x(),
            w: 0.0,
        };
        let [cf, cb, f, b] = split(&plane, square);
        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(f.len(), 1);
        assert_eq!(b.len(), 1);
        assert!(f[0].vertices.iter().all(|v| v.pos.x >= -EPSILON));
        assert!(b[0].vertices.iter().all(|v| v.pos.x <= EPSILON));
        assert_eq!(f[0].material, 3);
        // UVs interpolate with positions.
        assert!(f[0]
            .vertices
            .iter()
            .all(|v| (v.uv.x - v.pos.x).abs() < 1e-12));
    }

    #[test]
    fn coplanar_polygons_sort_by_orientation() {
        let tri = Polygon::new(
            vec![v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)],
            0,
        )
        .unwrap();
        let up = Plane {
            normal: Vector3::z(),
            w: 0.0,
        };
        let [cf, cb, ..] = split(&up, tri.clone());
        assert_eq!((cf.len(), cb.len()), (1, 0));

        let mut down = up;
        down.flip();
        let [cf, cb, ..] = split(&down, tri);
        assert_eq!((cf.len(), cb.len()), (0, 1));
    }

    #[test]
    fn color_interpolates_halfway() {
        let mut a = v(0.0, 0.0, 0.0);
        a.color = [0.0, 0.0, 0.0, 1.0];
        let b = v(2.0, 0.0, 0.0);
        let mid = a.interpolate(&b, 0.5);
        assert!((mid.color[0] - 0.5).abs() < 1e-6);
        assert!((mid.pos.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        assert!(Polygon::new(
            vec![v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(2.0, 0.0, 0.0)],
            0
        )
        .is_none());
    }
}

//! Starter geometry for new brushes and sectors.

use super::{Corner, Face, PolyMesh};
use crate::math::{Point2, Point3};

fn unit_uvs() -> [Point2; 4] {
    [
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ]
}

fn quad(vertices: [usize; 4]) -> Face {
    let uvs = unit_uvs();
    Face {
        corners: vertices
            .iter()
            .zip(uvs)
            .map(|(&v, uv)| Corner::with_uv(v, uv))
            .collect(),
        material: 0,
    }
}

/// Axis-aligned cube of edge length `size` centred on the origin, faces
/// wound counter-clockwise when seen from outside.
#[must_use]
pub fn cube(size: f64) -> PolyMesh {
    let h = size * 0.5;
    let positions = vec![
        Point3::new(-h, -h, -h),
        Point3::new(h, -h, -h),
        Point3::new(h, h, -h),
        Point3::new(-h, h, -h),
        Point3::new(-h, -h, h),
        Point3::new(h, -h, h),
        Point3::new(h, h, h),
        Point3::new(-h, h, h),
    ];
    let faces = vec![
        quad([0, 3, 2, 1]), // -Z
        quad([4, 5, 6, 7]), // +Z
        quad([0, 1, 5, 4]), // -Y
        quad([2, 3, 7, 6]), // +Y
        quad([1, 2, 6, 5]), // +X
        quad([3, 0, 4, 7]), // -X
    ];
    PolyMesh::from_parts(positions, faces)
}

/// Square of edge length `size` in the XY plane, facing +Z.
#[must_use]
pub fn plane(size: f64) -> PolyMesh {
    rectangle(size, size)
}

/// Rectangle `width` x `depth` in the XY plane centred on the origin, facing +Z.
#[must_use]
pub fn rectangle(width: f64, depth: f64) -> PolyMesh {
    let (hx, hy) = (width * 0.5, depth * 0.5);
    let positions = vec![
        Point3::new(-hx, -hy, 0.0),
        Point3::new(hx, -hy, 0.0),
        Point3::new(hx, hy, 0.0),
        Point3::new(-hx, hy, 0.0),
    ];
    PolyMesh::from_parts(positions, vec![quad([0, 1, 2, 3])])
}

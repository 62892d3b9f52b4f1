use tracing::trace;

use crate::brush::{TextureMapping, TextureParams};
use crate::math::{Point2, Point3, Vector3};
use crate::mesh::PolyMesh;
use crate::scene::Transform;

/// Dominant axis and sign of a face normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

/// Which texture parameter set a facing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceClass {
    Ceiling,
    Wall,
    Floor,
}

impl Facing {
    /// Classifies a normal by its largest absolute component.
    ///
    /// Components are compared x, then y, then z; on a tie the later axis
    /// wins.
    #[must_use]
    pub fn classify(normal: &Vector3) -> Self {
        let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
        let mut axis = 0;
        let mut best = ax;
        if ay >= best {
            axis = 1;
            best = ay;
        }
        if az >= best {
            axis = 2;
        }
        let positive = normal[axis] >= 0.0;
        match (axis, positive) {
            (0, true) => Self::PosX,
            (0, false) => Self::NegX,
            (1, true) => Self::PosY,
            (1, false) => Self::NegY,
            (_, true) => Self::PosZ,
            (_, false) => Self::NegZ,
        }
    }

    /// Parameter set for this facing: sides are walls, up is ceiling, down
    /// is floor.
    #[must_use]
    pub fn surface(self) -> SurfaceClass {
        match self {
            Self::PosX | Self::NegX | Self::PosY | Self::NegY => SurfaceClass::Wall,
            Self::PosZ => SurfaceClass::Ceiling,
            Self::NegZ => SurfaceClass::Floor,
        }
    }

    /// The two axes spanning the projection plane.
    #[must_use]
    pub fn plane_axes(self) -> (usize, usize) {
        match self {
            Self::PosX | Self::NegX => (1, 2),
            Self::PosY | Self::NegY => (0, 2),
            Self::PosZ | Self::NegZ => (0, 1),
        }
    }
}

impl TextureMapping {
    /// Parameters for a surface class.
    #[must_use]
    pub fn params(&self, surface: SurfaceClass) -> &TextureParams {
        match surface {
            SurfaceClass::Ceiling => &self.ceiling,
            SurfaceClass::Wall => &self.wall,
            SurfaceClass::Floor => &self.floor,
        }
    }
}

/// Projects one object-space point to a UV coordinate.
#[must_use]
pub fn project_uv(
    point: &Point3,
    facing: Facing,
    location: &Vector3,
    scale: &Vector3,
    params: &TextureParams,
) -> Point2 {
    let (a, b) = facing.plane_axes();
    let u = point[a] * scale[a] + location[a];
    let v = point[b] * scale[b] + location[b];
    let (sin, cos) = params.rotation_degrees.to_radians().sin_cos();
    let ru = u * cos - v * sin;
    let rv = u * sin + v * cos;
    Point2::new(
        ru * params.scale.x + params.shift.x,
        rv * params.scale.y + params.shift.y,
    )
}

/// Planar UV projection per face, chosen by the face's dominant axis.
///
/// Works on object-space geometry and folds in the source object's
/// location and scale; rotation is not taken into account.
#[derive(Debug, Clone, Copy)]
pub struct AutoTexture {
    location: Vector3,
    scale: Vector3,
    mapping: TextureMapping,
}

impl AutoTexture {
    /// Creates a projection for an object with the given location and scale.
    #[must_use]
    pub fn new(location: Vector3, scale: Vector3, mapping: TextureMapping) -> Self {
        Self {
            location,
            scale,
            mapping,
        }
    }

    /// Creates a projection from an object transform.
    #[must_use]
    pub fn from_transform(transform: &Transform, mapping: TextureMapping) -> Self {
        Self::new(transform.location, transform.scale, mapping)
    }

    /// Rewrites the UVs of every non-degenerate face and returns how many
    /// faces were textured.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        let mut textured = 0;
        for index in 0..mesh.face_count() {
            let Some(normal) = mesh.face_normal(index) else {
                continue;
            };
            let facing = Facing::classify(&normal);
            let params = self.mapping.params(facing.surface());
            let points = mesh.face_points(index);
            let uvs: Vec<Point2> = points
                .iter()
                .map(|p| project_uv(p, facing, &self.location, &self.scale, params))
                .collect();
            let face = &mut mesh.faces_mut()[index];
            if uvs.len() != face.len() {
                continue;
            }
            for (corner, uv) in face.corners.iter_mut().zip(uvs) {
                corner.uv = uv;
            }
            textured += 1;
        }
        trace!(faces = textured, "projected uvs");
        textured
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector2;
    use crate::mesh::primitives;
    use approx::assert_relative_eq;

    #[test]
    fn dominant_axis_with_signs() {
        assert_eq!(Facing::classify(&Vector3::new(0.9, 0.1, 0.2)), Facing::PosX);
        assert_eq!(Facing::classify(&Vector3::new(0.1, -0.9, 0.2)), Facing::NegY);
        assert_eq!(Facing::classify(&Vector3::new(0.1, 0.3, -0.9)), Facing::NegZ);
    }

    #[test]
    fn later_axis_wins_ties() {
        let d = std::f64::consts::FRAC_1_SQRT_2;
        assert_eq!(Facing::classify(&Vector3::new(d, d, 0.0)), Facing::PosY);
        assert_eq!(Facing::classify(&Vector3::new(0.0, -d, d)), Facing::PosZ);
        assert_eq!(Facing::classify(&Vector3::new(-d, 0.0, -d)), Facing::NegZ);
    }

    #[test]
    fn facings_pick_parameter_sets() {
        assert_eq!(Facing::PosZ.surface(), SurfaceClass::Ceiling);
        assert_eq!(Facing::NegZ.surface(), SurfaceClass::Floor);
        assert_eq!(Facing::PosX.surface(), SurfaceClass::Wall);
        assert_eq!(Facing::NegY.surface(), SurfaceClass::Wall);
    }

    #[test]
    fn ceiling_projection_closed_form() {
        let params = TextureParams {
            scale: Vector2::new(2.0, 2.0),
            shift: Vector2::new(0.5, 0.0),
            rotation_degrees: 90.0,
        };
        let point = Point3::new(0.3, 0.7, 4.0);
        let uv = project_uv(
            &point,
            Facing::PosZ,
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
            &params,
        );
        assert_relative_eq!(uv.x, -0.7 * 2.0 + 0.5, epsilon = 1e-12);
        assert_relative_eq!(uv.y, 0.3 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn object_location_and_scale_feed_the_projection() {
        let uv = project_uv(
            &Point3::new(9.0, 1.0, 2.0),
            Facing::NegX,
            &Vector3::new(0.0, 10.0, 20.0),
            &Vector3::new(1.0, 3.0, 0.5),
            &TextureParams::default(),
        );
        assert_relative_eq!(uv.x, 13.0);
        assert_relative_eq!(uv.y, 21.0);
    }

    #[test]
    fn cube_walls_use_wall_parameters() {
        let mut mapping = TextureMapping::default();
        mapping.wall.shift = Vector2::new(100.0, 0.0);
        mapping.ceiling.shift = Vector2::new(-100.0, 0.0);
        let mut mesh = primitives::cube(2.0);
        let textured = AutoTexture::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), mapping)
            .execute(&mut mesh);
        assert_eq!(textured, 6);

        for (index, face) in mesh.faces().iter().enumerate() {
            let facing = Facing::classify(&mesh.face_normal(index).unwrap());
            for corner in &face.corners {
                match facing.surface() {
                    SurfaceClass::Wall => assert!(corner.uv.x > 90.0),
                    SurfaceClass::Ceiling => assert!(corner.uv.x < -90.0),
                    SurfaceClass::Floor => assert!(corner.uv.x.abs() <= 1.0),
                }
            }
        }
    }
}

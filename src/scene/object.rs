use nalgebra::Rotation3;

use super::MeshId;
use crate::brush::Brush;
use crate::math::{round_to_places, Matrix4, Vector3};

slotmap::new_key_type! {
    /// Unique identifier for a scene object.
    pub struct ObjectId;
}

/// Object placement: location, XYZ euler rotation in radians, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub location: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity placement.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            location: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Identity rotation and scale at `location`.
    #[must_use]
    pub fn from_location(location: Vector3) -> Self {
        Self {
            location,
            ..Self::identity()
        }
    }

    /// Replaces the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.scale = scale;
        self
    }

    /// Local-to-world matrix: translation * rotation * scale.
    #[must_use]
    pub fn matrix(&self) -> Matrix4 {
        let rotation =
            Rotation3::from_euler_angles(self.rotation.x, self.rotation.y, self.rotation.z);
        Matrix4::new_translation(&self.location)
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// World-to-local matrix, or `None` when the scale is degenerate.
    #[must_use]
    pub fn inverse_matrix(&self) -> Option<Matrix4> {
        self.matrix().try_inverse()
    }

    /// Rounds the location to `places` decimals and returns whether it moved.
    pub fn round_location(&mut self, places: u32) -> bool {
        let rounded = self.location.map(|c| round_to_places(c, places));
        let moved = rounded != self.location;
        self.location = rounded;
        moved
    }
}

/// Viewport draw style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayType {
    #[default]
    Solid,
    Wire,
}

/// Visibility and interaction flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub selectable: bool,
    pub viewport: bool,
    pub render: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            selectable: true,
            viewport: true,
            render: true,
        }
    }
}

/// An object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    /// Mesh data, shared between objects when several reference it.
    pub mesh: Option<MeshId>,
    /// Brush data; `None` for ordinary objects.
    pub brush: Option<Brush>,
    pub display: DisplayType,
    pub visibility: Visibility,
}

impl SceneObject {
    /// Creates a plain object with no mesh and no brush data.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            mesh: None,
            brush: None,
            display: DisplayType::Solid,
            visibility: Visibility::default(),
        }
    }

    /// Attaches mesh data.
    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshId) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Attaches brush data.
    #[must_use]
    pub fn with_brush(mut self, brush: Brush) -> Self {
        self.brush = Some(brush);
        self
    }

    /// Sets the placement.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Returns `true` when the object carries brush data.
    #[must_use]
    pub fn is_brush(&self) -> bool {
        self.brush.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{transform_point, Point3, TOLERANCE};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn matrix_scales_then_rotates_then_translates() {
        let transform = Transform {
            location: Vector3::new(10.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, FRAC_PI_2),
            scale: Vector3::new(2.0, 1.0, 1.0),
        };
        let p = transform_point(&transform.matrix(), &Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(10.0, 2.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn zero_scale_has_no_inverse() {
        let transform = Transform::identity().with_scale(Vector3::new(1.0, 0.0, 1.0));
        assert!(transform.inverse_matrix().is_none());
    }

    #[test]
    fn round_location_reports_movement() {
        let mut transform = Transform::from_location(Vector3::new(0.123_45, 1.0, 2.0));
        assert!(transform.round_location(3));
        assert!((transform.location.x - 0.123).abs() < TOLERANCE);
        assert!(!transform.round_location(3));
    }
}

use tracing::trace;

use crate::math::round_point;
use crate::mesh::PolyMesh;

/// Rounds every vertex coordinate to a number of decimal places.
///
/// Ties go to even and negative zero becomes zero, so running it twice
/// changes nothing the second time.
#[derive(Debug, Clone, Copy)]
pub struct RoundPrecision {
    places: u32,
}

impl RoundPrecision {
    /// Creates a rounding to `places` decimals.
    #[must_use]
    pub fn new(places: u32) -> Self {
        Self { places }
    }

    /// Rounds in place and returns the number of vertices that changed.
    pub fn execute(&self, mesh: &mut PolyMesh) -> usize {
        let mut changed = 0;
        for p in mesh.positions_mut() {
            let rounded = round_point(p, self.places);
            if rounded != *p {
                changed += 1;
                *p = rounded;
            }
        }
        trace!(changed, places = self.places, "rounded vertices");
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::mesh::Face;

    #[test]
    fn second_pass_changes_nothing() {
        let positions = vec![
            Point3::new(0.123_456, -0.000_2, 1.0),
            Point3::new(2.5, 3.141_592_6, -7.777_7),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let mut mesh = PolyMesh::from_parts(positions, vec![Face::from_vertices(&[0, 1, 2], 0)]);
        let op = RoundPrecision::new(3);
        assert_eq!(op.execute(&mut mesh), 2);
        assert_eq!(op.execute(&mut mesh), 0);
        assert!(mesh.positions()[0].y.is_sign_positive());
    }
}

//! Polygon mesh with per-corner attributes.
//!
//! Faces are n-gons described by corner loops. Each corner references a
//! vertex and carries its own UV; color layers store one value per corner in
//! face order, so a color can change across an edge.

mod color;
mod material;
pub mod primitives;

pub use color::{
    ensure_color_layer, fill_color_layer, ColorAttributes, ColorLayer, Rgba, FALLBACK_LAYER_NAMES,
    WHITE,
};
pub use material::MaterialSlots;

use crate::math::polygon_3d::{polygon_area, polygon_normal};
use crate::math::{transform_point, Matrix4, Point2, Point3, Vector3};

/// One corner of a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    /// Index into the mesh positions.
    pub vertex: usize,
    /// Texture coordinate of this corner.
    pub uv: Point2,
}

impl Corner {
    /// Creates a corner with a zero UV.
    #[must_use]
    pub fn new(vertex: usize) -> Self {
        Self {
            vertex,
            uv: Point2::origin(),
        }
    }

    /// Creates a corner with the given UV.
    #[must_use]
    pub fn with_uv(vertex: usize, uv: Point2) -> Self {
        Self { vertex, uv }
    }
}

/// A polygonal face.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Corner loop, counter-clockwise when seen from the front.
    pub corners: Vec<Corner>,
    /// Index into the mesh material slots.
    pub material: usize,
}

impl Face {
    /// Creates a face from vertex indices with zero UVs.
    #[must_use]
    pub fn from_vertices(vertices: &[usize], material: usize) -> Self {
        Self {
            corners: vertices.iter().map(|&v| Corner::new(v)).collect(),
            material,
        }
    }

    /// Number of corners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// Returns `true` if the face has no corners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}

/// Polygon mesh with UVs, per-corner colors and material slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    positions: Vec<Point3>,
    faces: Vec<Face>,
    colors: ColorAttributes,
    materials: MaterialSlots,
    auto_smooth: Option<f64>,
}

impl PolyMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh from positions and faces, without color layers.
    #[must_use]
    pub fn from_parts(positions: Vec<Point3>, faces: Vec<Face>) -> Self {
        Self {
            positions,
            faces,
            ..Self::default()
        }
    }

    /// Returns `true` if the mesh has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Total number of face corners.
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(Face::len).sum()
    }

    /// Vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Mutable vertex positions.
    pub fn positions_mut(&mut self) -> &mut [Point3] {
        &mut self.positions
    }

    /// Faces.
    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Mutable faces.
    ///
    /// Callers may edit UVs and materials but must not change corner counts;
    /// color layers are indexed by corner.
    pub fn faces_mut(&mut self) -> &mut [Face] {
        &mut self.faces
    }

    /// Color layers.
    #[must_use]
    pub fn colors(&self) -> &ColorAttributes {
        &self.colors
    }

    /// Mutable color layers.
    pub fn colors_mut(&mut self) -> &mut ColorAttributes {
        &mut self.colors
    }

    /// Replaces every color layer.
    pub fn set_colors(&mut self, colors: ColorAttributes) {
        self.colors = colors;
    }

    /// Material slots.
    #[must_use]
    pub fn materials(&self) -> &MaterialSlots {
        &self.materials
    }

    /// Mutable material slots.
    pub fn materials_mut(&mut self) -> &mut MaterialSlots {
        &mut self.materials
    }

    /// Auto smooth angle in radians, if enabled.
    #[must_use]
    pub fn auto_smooth(&self) -> Option<f64> {
        self.auto_smooth
    }

    /// Enables (`Some(angle)`) or disables auto smooth.
    pub fn set_auto_smooth(&mut self, angle: Option<f64>) {
        self.auto_smooth = angle;
    }

    /// Start offset of each face in the flattened corner sequence.
    #[must_use]
    pub fn corner_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.faces.len());
        let mut acc = 0;
        for face in &self.faces {
            offsets.push(acc);
            acc += face.len();
        }
        offsets
    }

    /// Positions of the corners of a face.
    #[must_use]
    pub fn face_points(&self, face: usize) -> Vec<Point3> {
        self.faces.get(face).map_or_else(Vec::new, |f| {
            f.corners
                .iter()
                .filter_map(|c| self.positions.get(c.vertex).copied())
                .collect()
        })
    }

    /// Unit normal of a face, or `None` for degenerate faces.
    #[must_use]
    pub fn face_normal(&self, face: usize) -> Option<Vector3> {
        polygon_normal(&self.face_points(face))
    }

    /// Area of a face.
    #[must_use]
    pub fn face_area(&self, face: usize) -> f64 {
        polygon_area(&self.face_points(face))
    }

    /// Returns `true` if every coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.positions
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }

    /// Builds a mesh from new topology, carrying this mesh's materials,
    /// smoothing and color layers.
    ///
    /// `sources` holds, for every corner of `faces` in order, the index of
    /// the corner of `self` whose color values it inherits.
    #[must_use]
    pub fn derive(&self, positions: Vec<Point3>, faces: Vec<Face>, sources: &[usize]) -> Self {
        Self {
            positions,
            faces,
            colors: self.colors.gather(sources),
            materials: self.materials.clone(),
            auto_smooth: self.auto_smooth,
        }
    }

    /// Replaces topology in place; see [`PolyMesh::derive`].
    pub fn rebuild(&mut self, positions: Vec<Point3>, faces: Vec<Face>, sources: &[usize]) {
        self.colors = self.colors.gather(sources);
        self.positions = positions;
        self.faces = faces;
    }

    /// Reverses the winding of the listed faces, keeping corner attributes
    /// attached to their vertices.
    pub fn reverse_faces(&mut self, flip: &[bool]) {
        let offsets = self.corner_offsets();
        let mut sources = Vec::with_capacity(self.corner_count());
        let mut faces = Vec::with_capacity(self.faces.len());
        for (index, face) in self.faces.iter().enumerate() {
            let start = offsets[index];
            let mut new_face = face.clone();
            if flip.get(index).copied().unwrap_or(false) {
                new_face.corners.reverse();
                sources.extend((0..face.len()).rev().map(|i| start + i));
            } else {
                sources.extend(start..start + face.len());
            }
            faces.push(new_face);
        }
        let positions = std::mem::take(&mut self.positions);
        self.rebuild(positions, faces, &sources);
    }

    /// Applies a 4x4 transformation to every vertex.
    ///
    /// Mirroring transforms reverse face winding so normals keep pointing
    /// the same way relative to the surface.
    pub fn transform(&mut self, matrix: &Matrix4) {
        for p in &mut self.positions {
            *p = transform_point(matrix, p);
        }
        let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        if linear.determinant() < 0.0 {
            let flip = vec![true; self.faces.len()];
            self.reverse_faces(&flip);
        }
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for a mesh without vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = self.positions.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.positions {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some((min, max))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    fn quad() -> PolyMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        PolyMesh::from_parts(positions, vec![Face::from_vertices(&[0, 1, 2, 3], 0)])
    }

    #[test]
    fn quad_normal_and_area() {
        let mesh = quad();
        let n = mesh.face_normal(0).unwrap();
        assert!((n.z - 1.0).abs() < TOLERANCE);
        assert!((mesh.face_area(0) - 1.0).abs() < TOLERANCE);
        assert_eq!(mesh.corner_count(), 4);
    }

    #[test]
    fn reverse_keeps_colors_on_vertices() {
        let mut mesh = quad();
        let layer = mesh.colors_mut().add("Col", 4, WHITE);
        mesh.colors_mut().layers_mut()[layer]
            .values_mut()
            .copy_from_slice(&[
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
                [0.5, 0.5, 0.5, 1.0],
            ]);
        mesh.reverse_faces(&[true]);

        let face = &mesh.faces()[0];
        assert_eq!(face.corners[0].vertex, 3);
        let values = mesh.colors().layers()[0].values();
        assert_eq!(values[0], [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(values[3], [1.0, 0.0, 0.0, 1.0]);
        assert!((mesh.face_normal(0).unwrap().z + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn mirror_transform_reverses_winding() {
        let mut mesh = quad();
        let mirror = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));
        mesh.transform(&mirror);
        // Still facing +Z after the mirror.
        assert!((mesh.face_normal(0).unwrap().z - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let (min, max) = quad().bounds().unwrap();
        assert!((min - Point3::new(0.0, 0.0, 0.0)).norm() < TOLERANCE);
        assert!((max - Point3::new(1.0, 1.0, 0.0)).norm() < TOLERANCE);
    }
}

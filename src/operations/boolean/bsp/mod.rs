//! Polygon BSP boolean solver.

mod node;
mod polygon;

use std::collections::HashMap;

use tracing::trace;

use self::node::Node;
use self::polygon::{Polygon, Vertex};
use super::{BooleanOp, BooleanSolver, SolverOptions};
use crate::error::SolverError;
use crate::mesh::{ColorAttributes, ColorLayer, Corner, Face, PolyMesh, Rgba, WHITE};
use crate::operations::cleanup::MergeByDistance;

/// Union and difference by clipping polygon BSP trees against each other.
///
/// Corner UVs and colors travel with the polygons and are interpolated
/// where polygons are split. Only the active color layer is carried; the
/// result has a single color layer named after the target's (or, for an
/// empty target, the operand's) active layer. Operand material slots are
/// matched to target slots by name; operand faces without a named material
/// land in an empty slot of the result. Both solver modes run the same
/// algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct BspSolver;

impl BspSolver {
    /// Creates the solver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BooleanSolver for BspSolver {
    fn name(&self) -> &'static str {
        "bsp"
    }

    fn apply(
        &self,
        target: &PolyMesh,
        operand: &PolyMesh,
        op: BooleanOp,
        options: &SolverOptions,
    ) -> Result<PolyMesh, SolverError> {
        let mut materials = target.materials().clone();
        let named: Vec<Option<usize>> = operand
            .materials()
            .slots()
            .iter()
            .map(|slot| slot.as_deref().and_then(|name| materials.position(name)))
            .collect();
        let slot_of = |m: usize| named.get(m).copied().flatten();
        let empty = operand
            .faces()
            .iter()
            .any(|face| slot_of(face.material).is_none())
            .then(|| materials.empty_slot());
        let b_polys = to_polygons(operand, |m| slot_of(m).or(empty).unwrap_or(0));
        if b_polys.is_empty() {
            return Err(SolverError::EmptyOperand);
        }
        let a_polys = to_polygons(target, |m| m);

        let layer_name = target
            .colors()
            .active()
            .or_else(|| operand.colors().active())
            .map(|layer| layer.name().to_owned());

        let polygons = if a_polys.is_empty() {
            match op {
                BooleanOp::Union => b_polys,
                BooleanOp::Difference => return Ok(target.clone()),
            }
        } else {
            let mut a = Node::new(a_polys);
            let mut b = Node::new(b_polys);
            if op == BooleanOp::Difference {
                a.invert();
            }
            a.clip_to(&b);
            b.clip_to(&a);
            b.invert();
            b.clip_to(&a);
            b.invert();
            a.build(b.all_polygons());
            if op == BooleanOp::Difference {
                a.invert();
            }
            a.all_polygons()
        };

        let mut mesh = from_polygons(&polygons, layer_name);
        *mesh.materials_mut() = materials;
        mesh.set_auto_smooth(target.auto_smooth());
        MergeByDistance::new(options.merge_threshold).execute(&mut mesh);
        if !mesh.is_finite() {
            return Err(SolverError::NonFinite);
        }
        trace!(
            ?op,
            mode = ?options.mode,
            faces = mesh.face_count(),
            "bsp boolean"
        );
        Ok(mesh)
    }
}

fn to_polygons(mesh: &PolyMesh, material: impl Fn(usize) -> usize) -> Vec<Polygon> {
    let colors = mesh.colors().active().map(ColorLayer::values);
    let mut corner = 0;
    let mut polygons = Vec::with_capacity(mesh.face_count());
    for face in mesh.faces() {
        let mut vertices = Vec::with_capacity(face.len());
        for c in &face.corners {
            if let Some(pos) = mesh.positions().get(c.vertex) {
                let color = colors
                    .and_then(|values| values.get(corner).copied())
                    .unwrap_or(WHITE);
                vertices.push(Vertex {
                    pos: *pos,
                    uv: c.uv,
                    color,
                });
            }
            corner += 1;
        }
        if let Some(polygon) = Polygon::new(vertices, material(face.material)) {
            polygons.push(polygon);
        }
    }
    polygons
}

fn from_polygons(polygons: &[Polygon], layer_name: Option<String>) -> PolyMesh {
    let mut index: HashMap<[u64; 3], usize> = HashMap::new();
    let mut positions = Vec::new();
    let mut faces = Vec::with_capacity(polygons.len());
    let mut colors: Vec<Rgba> = Vec::new();

    for polygon in polygons {
        let corners = polygon
            .vertices
            .iter()
            .map(|v| {
                let key = [v.pos.x.to_bits(), v.pos.y.to_bits(), v.pos.z.to_bits()];
                let vertex = *index.entry(key).or_insert_with(|| {
                    positions.push(v.pos);
                    positions.len() - 1
                });
                Corner::with_uv(vertex, v.uv)
            })
            .collect();
        colors.extend(polygon.vertices.iter().map(|v| v.color));
        faces.push(Face {
            corners,
            material: polygon.material,
        });
    }

    let mut mesh = PolyMesh::from_parts(positions, faces);
    if let Some(name) = layer_name {
        mesh.set_colors(ColorAttributes::single(ColorLayer::from_values(name, colors)));
    }
    mesh
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Matrix4, Point3, Vector3};
    use crate::mesh::{primitives, MaterialSlots};
    use approx::assert_relative_eq;

    fn cube_at(x: f64, y: f64, z: f64) -> PolyMesh {
        let mut mesh = primitives::cube(2.0);
        mesh.transform(&Matrix4::new_translation(&Vector3::new(x, y, z)));
        mesh
    }

    fn volume(mesh: &PolyMesh) -> f64 {
        let mut total = 0.0;
        for face in 0..mesh.face_count() {
            let points = mesh.face_points(face);
            for i in 1..points.len() - 1 {
                let (a, b, c) = (points[0].coords, points[i].coords, points[i + 1].coords);
                total += a.dot(&b.cross(&c)) / 6.0;
            }
        }
        total
    }

    fn apply(target: &PolyMesh, operand: &PolyMesh, op: BooleanOp) -> PolyMesh {
        BspSolver::new()
            .apply(target, operand, op, &SolverOptions::default())
            .unwrap()
    }

    #[test]
    fn union_of_overlapping_cubes() {
        let result = apply(&cube_at(0.0, 0.0, 0.0), &cube_at(1.0, 0.0, 0.0), BooleanOp::Union);
        assert_relative_eq!(volume(&result), 12.0, epsilon = 1e-6);
        let (min, max) = result.bounds().unwrap();
        assert_relative_eq!(min.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(max.x, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn difference_of_overlapping_cubes() {
        let result = apply(
            &cube_at(0.0, 0.0, 0.0),
            &cube_at(1.0, 0.0, 0.0),
            BooleanOp::Difference,
        );
        assert_relative_eq!(volume(&result), 4.0, epsilon = 1e-6);
        let (_, max) = result.bounds().unwrap();
        assert_relative_eq!(max.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_union_keeps_both() {
        let result = apply(&cube_at(0.0, 0.0, 0.0), &cube_at(5.0, 0.0, 0.0), BooleanOp::Union);
        assert_relative_eq!(volume(&result), 16.0, epsilon = 1e-6);
    }

    #[test]
    fn union_into_empty_target_is_the_operand() {
        let result = apply(&PolyMesh::new(), &cube_at(0.0, 0.0, 0.0), BooleanOp::Union);
        assert_eq!(result.face_count(), 6);
        assert_relative_eq!(volume(&result), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn difference_from_empty_target_stays_empty() {
        let result = apply(&PolyMesh::new(), &cube_at(0.0, 0.0, 0.0), BooleanOp::Difference);
        assert!(result.is_empty());
    }

    #[test]
    fn empty_operand_fails() {
        let err = BspSolver::new()
            .apply(
                &cube_at(0.0, 0.0, 0.0),
                &PolyMesh::new(),
                BooleanOp::Union,
                &SolverOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SolverError::EmptyOperand));
    }

    #[test]
    fn non_finite_output_fails() {
        let mut operand = cube_at(0.0, 0.0, 0.0);
        operand.positions_mut()[6] = Point3::new(f64::INFINITY, 1.0, 1.0);
        let result = BspSolver::new().apply(
            &PolyMesh::new(),
            &operand,
            BooleanOp::Union,
            &SolverOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn operand_materials_map_by_name() {
        let mut target = cube_at(0.0, 0.0, 0.0);
        *target.materials_mut() =
            MaterialSlots::from_names(vec![Some("stone".into()), Some("wood".into())]);
        let mut operand = cube_at(5.0, 0.0, 0.0);
        *operand.materials_mut() = MaterialSlots::from_names(vec![Some("wood".into())]);

        let result = apply(&target, &operand, BooleanOp::Union);
        assert_eq!(result.materials(), target.materials());
        let far: Vec<usize> = (0..result.face_count())
            .filter(|&f| result.face_points(f).iter().all(|p| p.x > 3.0))
            .map(|f| result.faces()[f].material)
            .collect();
        assert_eq!(far.len(), 6);
        assert!(far.iter().all(|&m| m == 1));
    }

    #[test]
    fn unnamed_operand_faces_get_an_empty_slot() {
        let mut target = cube_at(0.0, 0.0, 0.0);
        *target.materials_mut() = MaterialSlots::from_names(vec![Some("stone".into())]);
        let mut operand = cube_at(5.0, 0.0, 0.0);
        *operand.materials_mut() = MaterialSlots::from_names(vec![None]);

        let result = apply(&target, &operand, BooleanOp::Union);
        assert_eq!(result.materials().slots(), &[Some("stone".to_owned()), None]);
        let far: Vec<usize> = (0..result.face_count())
            .filter(|&f| result.face_points(f).iter().all(|p| p.x > 3.0))
            .map(|f| result.faces()[f].material)
            .collect();
        assert_eq!(far.len(), 6);
        assert!(far.iter().all(|&m| result.materials().get(m).is_none()));

        let again = apply(&result, &cube_at(-5.0, 0.0, 0.0), BooleanOp::Union);
        assert_eq!(again.materials().len(), 2);
    }

    #[test]
    fn colors_travel_with_operand_faces() {
        let mut target = cube_at(0.0, 0.0, 0.0);
        let corners = target.corner_count();
        target.colors_mut().add("Attribute", corners, WHITE);
        let mut operand = cube_at(1.0, 0.0, 0.0);
        let corners = operand.corner_count();
        operand
            .colors_mut()
            .add("Attribute", corners, [1.0, 0.0, 0.0, 1.0]);

        let result = apply(&target, &operand, BooleanOp::Union);
        let layer = result.colors().active().unwrap();
        assert_eq!(result.colors().len(), 1);
        assert_eq!(layer.name(), "Attribute");
        assert_eq!(layer.values().len(), result.corner_count());

        let mut k = 0;
        for face in 0..result.face_count() {
            let points = result.face_points(face);
            let on_far_side = points.iter().all(|p| (p.x - 2.0).abs() < 1e-9);
            for _ in &points {
                if on_far_side {
                    assert_eq!(layer.values()[k], [1.0, 0.0, 0.0, 1.0]);
                }
                k += 1;
            }
        }
    }
}

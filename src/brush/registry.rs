//! Brush discovery, creation and maintenance.

use std::collections::BTreeMap;

use tracing::debug;

use super::{Brush, BrushKind, BrushOnly, BrushShape, CsgOperation, HasCsgRole, Sector, ShellParams};
use crate::capabilities::HostCapabilities;
use crate::config::BuildConfig;
use crate::error::{Result, SceneError};
use crate::math::Vector3;
use crate::mesh::{ensure_color_layer, fill_color_layer, primitives, WHITE};
use crate::operations::snap::RoundPrecision;
use crate::scene::{DisplayType, MeshId, ObjectId, SceneObject, SceneStore, Transform};

/// Snapshot of one brush object taken at discovery time.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushEntry {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    pub brush: Brush,
    pub mesh: MeshId,
}

impl BrushEntry {
    /// Shell parameters for sectors, recomputed from the current heights.
    #[must_use]
    pub fn shell(&self) -> Option<ShellParams> {
        self.brush.shell()
    }
}

impl HasCsgRole for BrushEntry {
    fn csg_operation(&self) -> CsgOperation {
        self.brush.operation
    }

    fn csg_order(&self) -> i32 {
        self.brush.order
    }
}

/// Read-only view over the brushes of a scene.
#[derive(Debug, Clone, Copy)]
pub struct BrushRegistry<'a> {
    scene: &'a SceneStore,
}

impl<'a> BrushRegistry<'a> {
    /// Creates a registry over `scene`.
    #[must_use]
    pub fn new(scene: &'a SceneStore) -> Self {
        Self { scene }
    }

    /// All brushes with geometry, in discovery order, skipping `exclude`.
    #[must_use]
    pub fn entries(&self, exclude: Option<ObjectId>) -> Vec<BrushEntry> {
        self.scene
            .objects()
            .filter(|(id, _)| Some(*id) != exclude)
            .filter_map(|(id, object)| {
                let brush = object.brush.as_ref()?;
                let Some(mesh) = object.mesh else {
                    debug!(object = %object.name, "brush without mesh data, skipping");
                    return None;
                };
                Some(BrushEntry {
                    id,
                    name: object.name.clone(),
                    transform: object.transform,
                    brush: brush.clone(),
                    mesh,
                })
            })
            .collect()
    }

    /// Brush data of one object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or is not a brush.
    pub fn brush(&self, id: ObjectId) -> Result<&'a Brush> {
        let object = self.scene.object(id)?;
        Ok(object
            .brush
            .as_ref()
            .ok_or_else(|| SceneError::NotABrush(object.name.clone()))?)
    }

    /// Shell parameters of a sector, or `None` for plain brushes.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or is not a brush.
    pub fn shell(&self, id: ObjectId) -> Result<Option<ShellParams>> {
        Ok(self.brush(id)?.shell())
    }
}

/// Groups items by CSG order.
///
/// Returns `(order, indices)` pairs with ascending orders; indices inside a
/// group keep their input order.
#[must_use]
pub fn bucket_by_order<T: HasCsgRole>(items: &[T]) -> Vec<(i32, Vec<usize>)> {
    let mut buckets: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        buckets.entry(item.csg_order()).or_default().push(index);
    }
    buckets.into_iter().collect()
}

/// Adds a new brush or sector at a location.
///
/// Brushes start as a cube of size 2, sectors as a plane of size 2. The new
/// object draws as wire, is hidden from render, gets a white color layer
/// and becomes the only selected object.
#[derive(Debug, Clone, Copy)]
pub struct NewGeometry {
    kind: BrushKind,
    location: Vector3,
}

impl NewGeometry {
    /// Creates a new geometry operation at the origin.
    #[must_use]
    pub fn new(kind: BrushKind) -> Self {
        Self {
            kind,
            location: Vector3::zeros(),
        }
    }

    /// Places the new object at `location`.
    #[must_use]
    pub fn at(mut self, location: Vector3) -> Self {
        self.location = location;
        self
    }

    /// Executes the operation, returning the new object.
    ///
    /// # Errors
    ///
    /// Returns an error if the new object cannot be refreshed.
    pub fn execute(
        &self,
        scene: &mut SceneStore,
        config: &BuildConfig,
        capabilities: &HostCapabilities,
    ) -> Result<ObjectId> {
        let (mut mesh, base) = match self.kind {
            BrushKind::Brush => (primitives::cube(2.0), "BRUSH"),
            BrushKind::Sector => (primitives::plane(2.0), "SECTOR"),
        };
        if ensure_color_layer(&mut mesh, &config.color_attribute_name, capabilities).is_some() {
            fill_color_layer(&mut mesh, WHITE);
        }
        let mesh = scene.add_mesh(mesh);

        let name = scene.unique_name(base);
        let mut object = SceneObject::new(name)
            .with_mesh(mesh)
            .with_brush(Brush::new(self.kind))
            .with_transform(Transform::from_location(self.location));
        object.display = DisplayType::Wire;
        object.visibility.render = false;

        let id = scene.add_object(object);
        debug!(kind = ?self.kind, "added brush object");
        scene.selection_mut().select_only(id);
        RefreshBrush::new(id, config.map_precision).execute(scene)?;
        Ok(id)
    }
}

/// Re-syncs a brush after an edit: material slots and rounding.
///
/// A sector keeps exactly three slots (ceiling, floor, wall), a brush one.
/// Names missing from the material library leave their slot untouched. The
/// object location and mesh vertices are rounded to `precision` decimals.
#[derive(Debug, Clone, Copy)]
pub struct RefreshBrush {
    object: ObjectId,
    precision: u32,
}

impl RefreshBrush {
    /// Creates a refresh operation.
    #[must_use]
    pub fn new(object: ObjectId, precision: u32) -> Self {
        Self { object, precision }
    }

    /// Executes the refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing, is not a brush, or has no
    /// mesh.
    pub fn execute(&self, scene: &mut SceneStore) -> Result<()> {
        sync_material_slots(scene, self.object)?;
        scene.object_mut(self.object)?.transform.round_location(self.precision);
        let mesh = scene.object_mesh_mut(self.object)?;
        RoundPrecision::new(self.precision).execute(mesh);
        Ok(())
    }
}

/// Converts a brush between plain brush and sector.
///
/// CSG and texture settings survive; the shape payload is replaced with
/// defaults, so converting a sector drops its heights and shell.
#[derive(Debug, Clone, Copy)]
pub struct SetBrushKind {
    object: ObjectId,
    kind: BrushKind,
}

impl SetBrushKind {
    /// Creates a kind conversion.
    #[must_use]
    pub fn new(object: ObjectId, kind: BrushKind) -> Self {
        Self { object, kind }
    }

    /// Executes the conversion. Converting to the current kind is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing, is not a brush, or has no
    /// mesh.
    pub fn execute(&self, scene: &mut SceneStore) -> Result<()> {
        let object = scene.object_mut(self.object)?;
        let name = object.name.clone();
        let brush = object
            .brush
            .as_mut()
            .ok_or(SceneError::NotABrush(name))?;
        if brush.kind() == self.kind {
            return Ok(());
        }
        brush.shape = match self.kind {
            BrushKind::Brush => BrushShape::Brush(BrushOnly::default()),
            BrushKind::Sector => BrushShape::Sector(Sector::default()),
        };
        sync_material_slots(scene, self.object)
    }
}

fn sync_material_slots(scene: &mut SceneStore, id: ObjectId) -> Result<()> {
    let object = scene.object(id)?;
    let brush = object
        .brush
        .as_ref()
        .ok_or_else(|| SceneError::NotABrush(object.name.clone()))?;
    let wanted: Vec<Option<String>> = brush
        .slot_materials()
        .into_iter()
        .map(|name| name.filter(|n| scene.has_material(n)).map(str::to_owned))
        .collect();

    let slots = scene.object_mesh_mut(id)?.materials_mut();
    slots.resize(wanted.len());
    for (index, name) in wanted.into_iter().enumerate() {
        if name.is_some() {
            slots.set(index, name);
        }
    }
    Ok(())
}

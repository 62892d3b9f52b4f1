//! Brushes and sectors: placed primitives tagged with CSG semantics.

pub mod registry;
pub mod shell;

pub use registry::{bucket_by_order, BrushEntry, BrushRegistry, NewGeometry, RefreshBrush, SetBrushKind};
pub use shell::{compute_shell, ShellParams, Solidify};

use std::fmt;

use crate::error::OperationError;
use crate::math::Vector2;
use crate::mesh::PolyMesh;

/// How a brush combines with the level built so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CsgOperation {
    /// Union.
    #[default]
    Add,
    /// Difference.
    Subtract,
}

impl CsgOperation {
    /// Upper-case tag used in step labels.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Subtract => "SUBTRACT",
        }
    }
}

impl fmt::Display for CsgOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Anything that takes part in the ordered CSG build.
pub trait HasCsgRole {
    fn csg_operation(&self) -> CsgOperation;
    fn csg_order(&self) -> i32;
}

/// Shape kind without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushKind {
    Brush,
    Sector,
}

/// Planar texture parameters for one facing class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParams {
    pub scale: Vector2,
    pub shift: Vector2,
    pub rotation_degrees: f64,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            scale: Vector2::new(1.0, 1.0),
            shift: Vector2::zeros(),
            rotation_degrees: 0.0,
        }
    }
}

/// Texture parameters per facing class.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureMapping {
    pub ceiling: TextureParams,
    pub wall: TextureParams,
    pub floor: TextureParams,
}

/// Payload of a plain brush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrushOnly {
    pub material: Option<String>,
}

/// Payload of a sector: a footprint extruded between two heights.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub floor_height: f64,
    pub ceiling_height: f64,
    pub ceiling_material: Option<String>,
    pub floor_material: Option<String>,
    pub wall_material: Option<String>,
}

impl Default for Sector {
    fn default() -> Self {
        Self {
            floor_height: 0.0,
            ceiling_height: 4.0,
            ceiling_material: None,
            floor_material: None,
            wall_material: None,
        }
    }
}

impl Sector {
    /// Shell parameters for the current heights.
    #[must_use]
    pub fn shell(&self) -> ShellParams {
        compute_shell(self.floor_height, self.ceiling_height)
    }
}

/// Shape-specific brush data.
#[derive(Debug, Clone, PartialEq)]
pub enum BrushShape {
    Brush(BrushOnly),
    Sector(Sector),
}

/// CSG and texturing data attached to a scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub operation: CsgOperation,
    pub order: i32,
    /// Recompute UVs by planar projection at build time.
    pub auto_texture: bool,
    pub mapping: TextureMapping,
    pub shape: BrushShape,
}

impl Brush {
    /// Creates a brush of the given kind with default settings.
    #[must_use]
    pub fn new(kind: BrushKind) -> Self {
        let shape = match kind {
            BrushKind::Brush => BrushShape::Brush(BrushOnly::default()),
            BrushKind::Sector => BrushShape::Sector(Sector::default()),
        };
        Self {
            operation: CsgOperation::Add,
            order: 0,
            auto_texture: true,
            mapping: TextureMapping::default(),
            shape,
        }
    }

    /// Sets the CSG operation and order.
    #[must_use]
    pub fn with_csg(mut self, operation: CsgOperation, order: i32) -> Self {
        self.operation = operation;
        self.order = order;
        self
    }

    /// Shape kind.
    #[must_use]
    pub fn kind(&self) -> BrushKind {
        match self.shape {
            BrushShape::Brush(_) => BrushKind::Brush,
            BrushShape::Sector(_) => BrushKind::Sector,
        }
    }

    /// Sector payload, if this is a sector.
    #[must_use]
    pub fn sector(&self) -> Option<&Sector> {
        match &self.shape {
            BrushShape::Sector(sector) => Some(sector),
            BrushShape::Brush(_) => None,
        }
    }

    /// Mutable sector payload, if this is a sector.
    pub fn sector_mut(&mut self) -> Option<&mut Sector> {
        match &mut self.shape {
            BrushShape::Sector(sector) => Some(sector),
            BrushShape::Brush(_) => None,
        }
    }

    /// Shell parameters, recomputed from the sector heights on every call.
    #[must_use]
    pub fn shell(&self) -> Option<ShellParams> {
        self.sector().map(Sector::shell)
    }

    /// Material names in slot order: `[ceiling, floor, wall]` for a sector,
    /// `[material]` for a brush.
    #[must_use]
    pub fn slot_materials(&self) -> Vec<Option<&str>> {
        match &self.shape {
            BrushShape::Brush(b) => vec![b.material.as_deref()],
            BrushShape::Sector(s) => vec![
                s.ceiling_material.as_deref(),
                s.floor_material.as_deref(),
                s.wall_material.as_deref(),
            ],
        }
    }

    /// Evaluated geometry: the base mesh, with the shell applied for sectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be built.
    pub fn evaluate(&self, base: &PolyMesh) -> Result<PolyMesh, OperationError> {
        match self.shell() {
            Some(params) => Solidify::new(params).execute(base),
            None => Ok(base.clone()),
        }
    }
}

impl HasCsgRole for Brush {
    fn csg_operation(&self) -> CsgOperation {
        self.operation
    }

    fn csg_order(&self) -> i32 {
        self.order
    }
}

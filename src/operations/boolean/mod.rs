//! Boolean solving: the solver seam and the built-in BSP solver.

mod bsp;

pub use bsp::BspSolver;

use crate::brush::CsgOperation;
use crate::error::SolverError;
use crate::mesh::PolyMesh;

/// Coincident-vertex weld distance used by the build.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 1e-6;

/// Boolean operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
}

impl From<CsgOperation> for BooleanOp {
    fn from(op: CsgOperation) -> Self {
        match op {
            CsgOperation::Add => Self::Union,
            CsgOperation::Subtract => Self::Difference,
        }
    }
}

/// Precision/speed trade-off requested from the solver.
///
/// The build always asks for [`SolverMode::Exact`]. The mode is a hint for
/// [`BooleanSolver`] implementations that have a cheaper path;
/// [`BspSolver`] ignores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SolverMode {
    #[default]
    Exact,
    Fast,
}

/// Per-call solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub mode: SolverMode,
    /// Output vertices closer than this are welded.
    pub merge_threshold: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            mode: SolverMode::Exact,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }
}

/// A mesh boolean engine.
///
/// `apply` must not mutate its inputs. On success the returned mesh keeps
/// the target's material slots (operand faces mapped into them by name,
/// unnamed ones into an empty slot) and carries a color layer whenever either input had one.
pub trait BooleanSolver {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Combines `operand` into `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] when no result can be produced.
    fn apply(
        &self,
        target: &PolyMesh,
        operand: &PolyMesh,
        op: BooleanOp,
        options: &SolverOptions,
    ) -> Result<PolyMesh, SolverError>;
}

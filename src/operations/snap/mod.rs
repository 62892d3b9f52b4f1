//! Precision rounding and grid snapping.

mod grid;
mod live;
mod precision;

pub use grid::{GridSnap, MOVE_EPSILON};
pub use live::LiveSnap;
pub use precision::RoundPrecision;

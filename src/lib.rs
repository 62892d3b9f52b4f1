pub mod brush;
pub mod build;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod scene;

pub use brush::{Brush, BrushKind, CsgOperation};
pub use build::{BuildLevel, BuildReport, BuildState};
pub use capabilities::HostCapabilities;
pub use config::BuildConfig;
pub use error::{BrushworkError, Result};
pub use mesh::PolyMesh;
pub use operations::boolean::{BooleanOp, BooleanSolver, BspSolver, SolverMode, SolverOptions};
pub use scene::{ObjectId, SceneStore};

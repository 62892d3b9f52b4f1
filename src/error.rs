use thiserror::Error;

/// Top-level error type for the brushwork level builder.
#[derive(Debug, Error)]
pub enum BrushworkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Errors raised while loading or validating a [`crate::config::BuildConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("option {option} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        option: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("option {option} must be greater than zero, got {value}")]
    NotPositive { option: &'static str, value: f64 },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors related to scene lookups.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("object {0} is not a brush")]
    NotABrush(String),

    #[error("object {0} has no mesh data")]
    MissingMesh(String),
}

/// An action was invoked in a context where it cannot run.
///
/// These are user-facing rejections: nothing was mutated.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no active object")]
    NoActiveObject,

    #[error("active object {0} is not a mesh")]
    NotAMesh(String),

    #[error("{0} requires edit mode")]
    NotInEditMode(&'static str),
}

/// Errors related to mesh operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// A boolean solver could not produce a result for one step.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("operand has no usable faces")]
    EmptyOperand,

    #[error("solver produced non-finite coordinates")]
    NonFinite,

    #[error("boolean solver failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`BrushworkError`].
pub type Result<T> = std::result::Result<T, BrushworkError>;

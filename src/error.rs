use thiserror::Error;

/// Errors surfaced by the mutation engine and its collaborators.
///
/// Variants map directly onto the error kinds named in the engine's
/// design: capacity/lock/version preconditions fail fast, geometry and
/// store failures roll the enclosing mutation back untouched.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("plan capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("target district is locked")]
    LockedTarget,

    #[error("base_version {requested} is not a valid stored version (plan is at [{min}, {max}])")]
    VersionMismatch { requested: u64, min: u64, max: u64 },

    #[error("geometry operation failed: {0}")]
    GeometryError(String),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

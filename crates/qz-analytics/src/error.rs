use thiserror::Error;

/// Errors surfaced by the analytics and adaptive engines.
///
/// Most computations in this core degrade gracefully on missing data (empty
/// histories classify as `developing`, pattern rules default to `false`);
/// these variants cover the few places where a caller handed us something
/// malformed or asked for an aggregate that cannot be produced at all.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

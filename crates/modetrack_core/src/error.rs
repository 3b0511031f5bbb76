//! Error type shared by every tracking operation.

use thiserror::Error;

/// Structural failures that abort a tracking operation.
///
/// Numeric degeneracies (a step where nothing matches) are not errors. They
/// are reported through [`crate::tracker::StepReport`] and the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    /// Two vectors or mode sets that must agree in length do not.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A seed, data sequence, or matrix that needs at least one entry is empty.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Malformed configuration or inconsistent inputs.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TrackingError>;

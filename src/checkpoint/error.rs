//! Checkpoint error types.

use crate::engine::ConfigurationViolation;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Checkpoint version is not supported by this version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Checkpoint was taken from a different chart
    #[error("Checkpoint belongs to chart '{found}', expected '{expected}'")]
    ChartMismatch { expected: String, found: String },

    /// Restoring requires an idle state chart
    #[error("Cannot restore into a running state chart")]
    Running,

    /// Checkpoint names a state the chart does not declare
    #[error("Checkpoint refers to unknown state '{0}'")]
    UnknownState(String),

    /// Checkpoint data failed validation
    #[error("Checkpoint validation failed: {0}")]
    ValidationFailed(String),

    /// Restored configuration breaks a structural invariant
    #[error("Checkpoint configuration is invalid: {0}")]
    InvalidConfiguration(#[from] ConfigurationViolation),
}

//! Error types for volume provisioning.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for volume provisioning operations.
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

/// Errors that can occur while provisioning a durable volume.
///
/// Every variant is fatal: provisioning is never retried, and a colliding
/// path is never repaired or overwritten.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("invalid volume name: {0:?}")]
    InvalidName(String),

    #[error("volume {name:?} collides with a non-directory at {path:?}")]
    Collision { name: String, path: PathBuf },

    #[error("volume {name:?} has an unusable marker: {reason}")]
    Marker { name: String, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

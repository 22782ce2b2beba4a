//! Error types for role launch and readiness.

use std::process::ExitStatus;
use std::time::Duration;

use melt_core::VolumeKind;
use thiserror::Error;

/// Result type alias for launch operations.
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Errors that can occur while launching a role and waiting out its
/// startup window. Startup failures are surfaced, never retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("role command is empty")]
    EmptyCommand,

    #[error("role requires the {0} volume but it is not mounted")]
    MissingMount(VolumeKind),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while waiting on the role process: {0}")]
    Wait(#[from] std::io::Error),

    #[error("role process exited during startup with {status}")]
    ExitedEarly { status: ExitStatus },

    #[error("port {port} not ready within startup timeout of {timeout:?}")]
    StartupTimeout { port: u16, timeout: Duration },
}

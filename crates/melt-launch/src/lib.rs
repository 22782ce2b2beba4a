//! melt-launch — role process lifecycle for the MELT platform.
//!
//! Turns a resolved role spec into a running toolkit subprocess:
//! 1. Build the explicit environment contract from the role's mounted
//!    volumes
//! 2. Spawn the toolkit command in its own process group
//! 3. Poll the bound port until the role is ready or its startup window
//!    closes
//!
//! Lifecycle is `Starting → Ready | Failed`. After `Ready` the launcher
//! steps away; the instance keeps running when the handle is dropped, and
//! crash-restart policy belongs to the external platform. Instances of the
//! same role share state only through the mounted volumes.

pub mod env;
pub mod error;
pub mod launcher;
pub mod readiness;

pub use env::{CHECKPOINT_DIR, HF_HOME, LORA_DIR, Mounts, OUTPUT_DIR, ToolkitEnv};
pub use error::{LaunchError, LaunchResult};
pub use launcher::{LaunchPlan, RoleInstance, launch};
pub use readiness::{POLL_INTERVAL, RoleStatus, probe_port};

//! melt-volume — durable named volumes for the MELT platform.
//!
//! Volumes are directories under a single volumes root, one per
//! [`VolumeKind`](melt_core::VolumeKind). Each carries a small TOML marker
//! so provisioning can tell an earlier run's volume apart from unrelated
//! data occupying the same path. Provisioning is idempotent; collisions are
//! fatal and never repaired.
//!
//! Volume contents are shared by every role that mounts them. Nothing here
//! hands out exclusive access.

pub mod error;
pub mod set;

pub use error::{ProvisioningError, ProvisioningResult};
pub use set::{VolumeHandle, VolumeSet};

//! Toolkit environment contract.
//!
//! The filesystem + environment-variable contract is the sole integration
//! surface between this system and the opaque toolkit. The hosted
//! deployment built it by mutating the worker's global environment before
//! spawning; here the same variable names are computed from the role's
//! mounted volumes into an explicit [`ToolkitEnv`] that is passed only to
//! the child process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use melt_core::{RoleSpec, VolumeKind};
use serde::Serialize;

use crate::error::{LaunchError, LaunchResult};

/// Where the toolkit looks for model checkpoints.
pub const CHECKPOINT_DIR: &str = "ACE_STEP_CHECKPOINT_DIR";
/// Registry cache root; kept on the models volume so nothing lands outside
/// durable storage.
pub const HF_HOME: &str = "HF_HOME";
/// Where generation results are written.
pub const OUTPUT_DIR: &str = "OUTPUT_DIR";
/// Where training adapters are written.
pub const LORA_DIR: &str = "LORA_DIR";

/// Volume mount table for one role instance.
#[derive(Debug, Clone, Default)]
pub struct Mounts {
    volumes: BTreeMap<VolumeKind, PathBuf>,
}

impl Mounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, kind: VolumeKind, path: impl Into<PathBuf>) -> Self {
        self.volumes.insert(kind, path.into());
        self
    }

    pub fn get(&self, kind: VolumeKind) -> Option<&Path> {
        self.volumes.get(&kind).map(PathBuf::as_path)
    }
}

/// Explicit environment contract handed to a toolkit subprocess.
///
/// Every exported value is a path under one of the role's mounted volume
/// roots. The registry token is deliberately absent: roles read their
/// checkpoints from the volume, and the token stays with the fetcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolkitEnv {
    vars: BTreeMap<&'static str, String>,
}

impl ToolkitEnv {
    /// Build the contract for `spec` from its mounted volumes.
    ///
    /// Fails with [`LaunchError::MissingMount`] before any spawn when a
    /// volume the spec requires is absent from `mounts`.
    pub fn for_role(spec: &RoleSpec, mounts: &Mounts) -> LaunchResult<Self> {
        let mut vars = BTreeMap::new();
        for kind in &spec.mounts {
            let path = mounts
                .get(*kind)
                .ok_or(LaunchError::MissingMount(*kind))?
                .to_string_lossy()
                .into_owned();
            match kind {
                VolumeKind::Models => {
                    vars.insert(CHECKPOINT_DIR, path.clone());
                    vars.insert(HF_HOME, path);
                }
                VolumeKind::Outputs => {
                    vars.insert(OUTPUT_DIR, path);
                }
                VolumeKind::Loras => {
                    vars.insert(LORA_DIR, path);
                }
            }
        }
        Ok(Self { vars })
    }

    pub fn get(&self, var: &str) -> Option<&str> {
        self.vars.get(var).map(String::as_str)
    }

    /// Variables in stable order, ready for `Command::envs`.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.vars.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

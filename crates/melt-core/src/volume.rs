//! Volume identities shared across the platform.
//!
//! Three durable storage areas back the whole deployment. Their names are
//! stable platform-level identifiers; every role addresses a volume by kind
//! and receives its path at deploy time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Application namespace prefixed onto every durable volume name.
pub const APP_NAME: &str = "melt-c0r3";

/// The three durable storage areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeKind {
    /// Model weights. Read-mostly once the initial fetch has completed.
    Models,
    /// Fine-tuned adapters. Written by the trainer, read by api/experience.
    Loras,
    /// Generated audio. Written by api/experience.
    Outputs,
}

impl VolumeKind {
    pub const ALL: [VolumeKind; 3] = [VolumeKind::Models, VolumeKind::Loras, VolumeKind::Outputs];

    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeKind::Models => "models",
            VolumeKind::Loras => "loras",
            VolumeKind::Outputs => "outputs",
        }
    }

    /// Durable volume name as registered with the platform.
    pub fn volume_name(&self) -> String {
        format!("{APP_NAME}-{}", self.as_str())
    }
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Subcommand implementations for the `melt` binary.

pub mod deploy;
pub mod fetch;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use melt_core::{MeltConfig, RoleName};

/// Load configuration and apply the --data-dir override.
pub fn load_config(config: Option<&Path>, data_dir: Option<PathBuf>) -> Result<MeltConfig> {
    let mut cfg = MeltConfig::load(config).context("Failed to load configuration")?;
    if let Some(dir) = data_dir {
        cfg.platform.data_dir = dir;
    }
    Ok(cfg)
}

/// Parse a role argument.
pub fn parse_role(role: &str) -> Result<RoleName> {
    Ok(role.parse()?)
}

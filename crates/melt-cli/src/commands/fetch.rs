//! `melt fetch-models` — populate the models volume.
//!
//! Run once before the first deploy (and again whenever the registry list
//! changes). Re-running is safe: the downloader resumes or no-ops over
//! existing destinations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use melt_core::VolumeKind;
use melt_fetch::{Fetcher, format_report};
use melt_volume::VolumeSet;
use tracing::info;

pub fn fetch_models(config: Option<&Path>, data_dir: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config, data_dir)?;

    let volumes =
        VolumeSet::open(config.volumes_root()).context("Failed to open the volumes root")?;
    let models = volumes
        .get_or_create(VolumeKind::Models)
        .context("Failed to provision the models volume")?;
    info!(volume = %models.name, path = %models.path.display(), "models volume ready");

    let fetcher = Fetcher::new(&models.path)?;
    let report = fetcher.fetch_all(&config.registry.models);

    println!("{}", format_report(&report));

    // Fail-soft contract: every model was attempted; failures are visible
    // in the report and the logs, and the exit code stays 0.
    Ok(())
}

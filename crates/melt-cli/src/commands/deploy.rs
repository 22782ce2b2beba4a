//! `melt deploy <role>` — provision volumes, launch, wait for readiness.
//!
//! Each role is independently deployable and redeployable. The command
//! validates the image spec, provisions the role's volumes idempotently,
//! builds the environment contract, spawns the toolkit, and waits until
//! the role's port accepts connections (bounded by its startup timeout).
//! On readiness it detaches and exits: the running role belongs to the
//! platform from then on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use melt_core::RoleSpec;
use melt_launch::{LaunchPlan, Mounts, ToolkitEnv, launch};
use melt_volume::VolumeSet;
use tracing::info;

pub async fn deploy(role: &str, config: Option<&Path>, data_dir: Option<PathBuf>) -> Result<()> {
    let name = super::parse_role(role)?;
    let config = super::load_config(config, data_dir)?;

    config
        .image
        .validate()
        .context("Invalid execution image spec")?;
    let spec = RoleSpec::for_role(name, &config)?;
    info!(role = %name, gpu = %spec.gpu, port = spec.port, "deploying role");

    let volumes =
        VolumeSet::open(config.volumes_root()).context("Failed to open the volumes root")?;
    let mut mounts = Mounts::new();
    for kind in &spec.mounts {
        let vol = volumes
            .get_or_create(*kind)
            .with_context(|| format!("Failed to provision the {kind} volume"))?;
        mounts = mounts.add(*kind, vol.path);
    }

    let env = ToolkitEnv::for_role(&spec, &mounts)?;
    let plan = LaunchPlan::new(spec, env);

    let mut instance = launch(&plan)?;
    instance
        .wait_ready()
        .await
        .with_context(|| format!("Role {name} failed to become ready"))?;

    let pid = instance
        .pid()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("✓ {name} ready on port {} (pid {pid})", plan.spec.port);
    instance.detach();
    Ok(())
}

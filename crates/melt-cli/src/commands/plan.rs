//! `melt plan <role>` — render the resolved launch plan without spawning.
//!
//! Performs no filesystem writes: volume paths are shown as they would be
//! under the configured data root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use melt_core::{MeltConfig, RoleSpec};
use melt_launch::{LaunchPlan, Mounts, ToolkitEnv};
use melt_volume::VolumeSet;
use serde::Serialize;

/// Serializable view of a launch plan for `--format json`.
#[derive(Debug, Serialize)]
struct PlanSummary<'a> {
    role: &'a str,
    gpu: String,
    port: u16,
    max_concurrent: u32,
    startup_timeout_secs: u64,
    mounts: Vec<String>,
    command: &'a [String],
    env: &'a ToolkitEnv,
    image_steps: Vec<String>,
}

pub fn plan(
    role: &str,
    config: Option<&Path>,
    data_dir: Option<PathBuf>,
    format: &str,
) -> Result<()> {
    let name = super::parse_role(role)?;
    let config = super::load_config(config, data_dir)?;
    config
        .image
        .validate()
        .context("Invalid execution image spec")?;

    let spec = RoleSpec::for_role(name, &config)?;
    let plan = resolve(spec, &config)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summarize(&plan, &config))?),
        _ => println!("{}", format_plan(&plan, &config)),
    }

    Ok(())
}

/// Resolve a spec against the paths its volumes would occupy.
fn resolve(spec: RoleSpec, config: &MeltConfig) -> Result<LaunchPlan> {
    let volumes = VolumeSet::at(config.volumes_root());
    let mut mounts = Mounts::new();
    for kind in &spec.mounts {
        mounts = mounts.add(*kind, volumes.handle(*kind).path);
    }
    let env = ToolkitEnv::for_role(&spec, &mounts)?;
    Ok(LaunchPlan::new(spec, env))
}

fn summarize<'a>(plan: &'a LaunchPlan, config: &MeltConfig) -> PlanSummary<'a> {
    PlanSummary {
        role: plan.spec.name.as_str(),
        gpu: plan.spec.gpu.to_string(),
        port: plan.spec.port,
        max_concurrent: plan.spec.max_concurrent,
        startup_timeout_secs: plan.spec.startup_timeout.as_secs(),
        mounts: plan.spec.mounts.iter().map(|k| k.volume_name()).collect(),
        command: &plan.spec.command,
        env: &plan.env,
        image_steps: config.image.build_steps(),
    }
}

fn format_plan(plan: &LaunchPlan, config: &MeltConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("Role: {}\n", plan.spec.name));
    out.push_str(&format!("  GPU:            {}\n", plan.spec.gpu));
    out.push_str(&format!("  Port:           {}\n", plan.spec.port));
    out.push_str(&format!("  Max concurrent: {}\n", plan.spec.max_concurrent));
    out.push_str(&format!(
        "  Startup window: {}s\n",
        plan.spec.startup_timeout.as_secs()
    ));
    out.push_str(&format!("  Command:        {}\n", plan.spec.command_line()));

    out.push_str("\nMounts:\n");
    for kind in &plan.spec.mounts {
        out.push_str(&format!("  • {}\n", kind.volume_name()));
    }

    out.push_str("\nEnvironment:\n");
    for (var, value) in plan.env.iter() {
        out.push_str(&format!("  {var}={value}\n"));
    }

    out.push_str("\nImage:\n");
    for step in config.image.build_steps() {
        out.push_str(&format!("  {step}\n"));
    }

    out
}

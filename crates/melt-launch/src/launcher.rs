//! Spawning role processes and waiting out their startup window.
//!
//! The launch is fire-and-forget: the child goes into its own process
//! group, nothing kills it on drop, and once ready it belongs to the
//! external platform. The launcher's whole job is to get it started and
//! report `Ready` or `Failed` honestly.

use std::process::Stdio;

use melt_core::RoleSpec;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::env::ToolkitEnv;
use crate::error::{LaunchError, LaunchResult};
use crate::readiness::{POLL_INTERVAL, RoleStatus, probe_port};

/// A role spec resolved against mounted volumes: everything needed to
/// spawn, and everything `melt plan` renders.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub spec: RoleSpec,
    pub env: ToolkitEnv,
}

impl LaunchPlan {
    pub fn new(spec: RoleSpec, env: ToolkitEnv) -> Self {
        Self { spec, env }
    }
}

/// A spawned role instance inside its startup window.
#[derive(Debug)]
pub struct RoleInstance {
    child: Child,
    spec: RoleSpec,
    status: RoleStatus,
}

/// Spawn the toolkit process for `plan`.
///
/// The child runs in its own process group so terminal signals aimed at
/// the launcher never reach it, and it keeps running when the returned
/// handle is dropped.
pub fn launch(plan: &LaunchPlan) -> LaunchResult<RoleInstance> {
    let (program, args) = plan
        .spec
        .command
        .split_first()
        .ok_or(LaunchError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).envs(plan.env.iter());
    // Isolate the role from Ctrl+C at the operator's terminal.
    #[cfg(unix)]
    cmd.process_group(0);

    debug!("Running: {:?}", cmd);
    let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        program: program.clone(),
        source,
    })?;

    info!(
        role = %plan.spec.name,
        pid = child.id(),
        port = plan.spec.port,
        "role process spawned"
    );
    Ok(RoleInstance {
        child,
        spec: plan.spec.clone(),
        status: RoleStatus::Starting,
    })
}

impl RoleInstance {
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn status(&self) -> RoleStatus {
        self.status
    }

    pub fn spec(&self) -> &RoleSpec {
        &self.spec
    }

    /// Drive the startup window: poll the port until it accepts, the child
    /// exits, or the spec's startup timeout elapses.
    pub async fn wait_ready(&mut self) -> LaunchResult<()> {
        let deadline = Instant::now() + self.spec.startup_timeout;
        loop {
            // Child death first: a dead process will never open the port.
            if let Some(status) = self.child.try_wait()? {
                self.status = RoleStatus::Failed;
                warn!(role = %self.spec.name, %status, "role exited during startup");
                return Err(LaunchError::ExitedEarly { status });
            }
            if probe_port(self.spec.port).await {
                self.status = RoleStatus::Ready;
                info!(role = %self.spec.name, port = self.spec.port, "role ready");
                return Ok(());
            }
            if Instant::now() >= deadline {
                self.status = RoleStatus::Failed;
                warn!(
                    role = %self.spec.name,
                    port = self.spec.port,
                    timeout = ?self.spec.startup_timeout,
                    "startup window elapsed"
                );
                return Err(LaunchError::StartupTimeout {
                    port: self.spec.port,
                    timeout: self.spec.startup_timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Consume the handle, leaving the role running. Anything after this
    /// point, including restarts, belongs to the external platform.
    pub fn detach(self) {}
}

//! Model fetching via the registry's own download tool.
//!
//! The hosted deployment ran one `huggingface-cli download` per model inside
//! a one-shot task. This reproduces that behavior as subprocess invocations
//! with an explicit per-child environment: `HF_HOME` is pointed at the
//! models volume root so every byte the tool caches lands in durable
//! storage, and the auth token travels only in the child's environment,
//! never by mutating this process.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::report::{FetchOutcome, FetchReport, ModelFetch, dir_summary};

/// Environment variable overriding downloader discovery.
pub const DOWNLOADER_ENV: &str = "MELT_HF_CLI";

/// Map a registry identifier to its directory name under the models volume
/// root. Deterministic, and injective for identifiers that differ in
/// anything other than the separator.
pub fn sanitize_repo_id(repo_id: &str) -> String {
    repo_id.replace('/', "_")
}

/// Locate the registry download tool.
///
/// Search order:
/// 1. `$MELT_HF_CLI` environment variable
/// 2. `huggingface-cli` on `$PATH`
pub fn find_downloader() -> Result<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(DOWNLOADER_ENV) {
        let tool = PathBuf::from(&path);
        if tool.is_file() {
            debug!("Found downloader at {} (from {DOWNLOADER_ENV})", tool.display());
            return Ok(tool);
        }
    }

    // 2. System PATH
    if let Ok(output) = Command::new("which").arg("huggingface-cli").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                debug!("Found downloader at {path} (system PATH)");
                return Ok(PathBuf::from(path));
            }
        }
    }

    bail!(
        "huggingface-cli not found.\n\
         \n\
         To install, run:\n\
         \n\
         \x20 pip install -U huggingface_hub\n\
         \n\
         Or set {DOWNLOADER_ENV} to point to your download tool."
    )
}

/// One-shot model fetcher targeting a models volume root.
pub struct Fetcher {
    downloader: PathBuf,
    dest_root: PathBuf,
    token: Option<String>,
}

impl Fetcher {
    /// Discover the downloader and read `HF_TOKEN` from the environment.
    /// An absent or empty token means anonymous fetch, never an error.
    pub fn new(dest_root: impl Into<PathBuf>) -> Result<Self> {
        let token = std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty());
        Ok(Self {
            downloader: find_downloader()?,
            dest_root: dest_root.into(),
            token,
        })
    }

    /// Use an explicit downloader binary instead of discovery. Token starts
    /// unset; see [`Fetcher::token`].
    pub fn with_downloader(downloader: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            downloader: downloader.into(),
            dest_root: dest_root.into(),
            token: None,
        }
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Destination directory for a model, derived purely from the identifier.
    pub fn dest_for(&self, repo_id: &str) -> PathBuf {
        self.dest_root.join(sanitize_repo_id(repo_id))
    }

    /// Fetch every model on the list, one downloader run per identifier.
    ///
    /// Fail-soft: a failed model is recorded in the report and the remaining
    /// models are still attempted. Nothing is rolled back.
    pub fn fetch_all(&self, models: &[String]) -> FetchReport {
        let mut report = FetchReport::default();
        for repo_id in models {
            let dest = self.dest_for(repo_id);
            info!(%repo_id, dest = %dest.display(), "fetching model");
            let outcome = match self.fetch_one(repo_id, &dest) {
                Ok(()) => {
                    let (files, bytes) = dir_summary(&dest);
                    info!(%repo_id, files, bytes, "model fetched");
                    FetchOutcome::Fetched { files, bytes }
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(%repo_id, %reason, "model fetch failed");
                    FetchOutcome::Failed { reason }
                }
            };
            report.models.push(ModelFetch {
                repo_id: repo_id.clone(),
                dest,
                outcome,
            });
        }
        report
    }

    fn fetch_one(&self, repo_id: &str, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut cmd = Command::new(&self.downloader);
        cmd.arg("download")
            .arg(repo_id)
            .arg("--local-dir")
            .arg(dest)
            .env("HF_HOME", &self.dest_root);
        // The child sees HF_TOKEN exactly when this fetcher carries one.
        match &self.token {
            Some(token) => cmd.env("HF_TOKEN", token),
            None => cmd.env_remove("HF_TOKEN"),
        };
        debug!("Running: {:?}", cmd);

        let output = cmd.output().with_context(|| {
            format!("Failed to execute downloader at {}", self.downloader.display())
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "downloader exited with {} for {repo_id}: {}",
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

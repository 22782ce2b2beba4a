//! Execution image specification.
//!
//! Every service role runs inside the same reproducible environment: a CUDA
//! base image with the system packages and setup commands the toolkit needs.
//! The platform builds the actual image; this spec is the declarative input,
//! rendered as an ordered list of build steps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image base reference is empty")]
    EmptyBase,
    #[error("image workdir must be an absolute path: {0:?}")]
    RelativeWorkdir(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSpec {
    /// Base image reference.
    pub base: String,
    /// Python version installed on top of the base.
    pub python: String,
    /// System packages installed via the distro package manager.
    pub system_packages: Vec<String>,
    /// Shell commands run during the build, in order.
    pub setup_commands: Vec<String>,
    /// Working directory inside the image.
    pub workdir: String,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            base: "nvidia/cuda:12.8.0-devel-ubuntu22.04".to_string(),
            python: "3.11".to_string(),
            system_packages: ["git", "ffmpeg", "libsndfile1", "build-essential"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            setup_commands: vec!["pip install uv".to_string()],
            workdir: "/repo".to_string(),
        }
    }
}

impl ImageSpec {
    /// Check the spec before handing it to the platform. Failures here are
    /// provisioning errors: fatal, no retry.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.base.trim().is_empty() {
            return Err(ImageError::EmptyBase);
        }
        if !self.workdir.starts_with('/') {
            return Err(ImageError::RelativeWorkdir(self.workdir.clone()));
        }
        Ok(())
    }

    /// Render the ordered build steps the platform executes.
    pub fn build_steps(&self) -> Vec<String> {
        let mut steps = vec![format!("from_registry {} python={}", self.base, self.python)];
        if !self.system_packages.is_empty() {
            steps.push(format!("apt_install {}", self.system_packages.join(" ")));
        }
        for cmd in &self.setup_commands {
            steps.push(format!("run_commands {cmd}"));
        }
        steps.push(format!("workdir {}", self.workdir));
        steps
    }
}

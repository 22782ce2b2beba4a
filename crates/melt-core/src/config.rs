//! melt.toml configuration parser.
//!
//! Every field is optional. The defaults reproduce the canonical MELT-C0R3
//! deployment (ports, GPU classes, model list, image recipe), so running
//! without a config file deploys the original platform unchanged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::image::ImageSpec;

/// Default registry model list: the turbo DiT weights plus the strongest
/// composition LM.
pub const DEFAULT_MODELS: [&str; 2] = ["ACE-Step/Ace-Step1.5", "ACE-Step/acestep-5Hz-lm-4B"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeltConfig {
    pub platform: PlatformConfig,
    pub registry: RegistryConfig,
    pub image: ImageSpec,
    pub roles: RolesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Root directory for durable state; volumes live under `<data_dir>/volumes`.
    pub data_dir: PathBuf,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/melt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry-qualified model identifiers fetched into the models volume.
    pub models: Vec<String>,
    /// Language model selected by the api and experience roles.
    pub lm_model: String,
    /// DiT config name selected by the experience role.
    pub dit_config: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            lm_model: "acestep-5Hz-lm-4B".to_string(),
            dit_config: "acestep-v15-turbo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    pub api: RoleConfig,
    pub experience: RoleConfig,
    pub trainer: RoleConfig,
}

/// Per-role overrides. A section may set any subset of fields; unset
/// fields resolve to the role's canonical parameters when its `RoleSpec`
/// is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Port the role's subprocess binds.
    pub port: Option<u16>,
    /// GPU requirement, platform syntax ("A100", "A100:2").
    pub gpu: Option<String>,
    /// Maximum concurrent requests per process instance.
    pub max_concurrent: Option<u32>,
    /// Readiness deadline (e.g., "300s").
    pub startup_timeout: Option<String>,
}

impl MeltConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MeltConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration: an explicit path must exist; otherwise
    /// `./melt.toml` is used when present, and defaults apply when not.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let local = Path::new("melt.toml");
                if local.is_file() {
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Volumes root under the platform data directory.
    pub fn volumes_root(&self) -> PathBuf {
        self.platform.data_dir.join("volumes")
    }
}

/// Parse a duration string like "5s", "500ms", "2m".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

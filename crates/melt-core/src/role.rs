//! Service role definitions.
//!
//! A role is one deployable unit: the GPU it needs, the volumes it mounts,
//! the port it binds, and the toolkit command that serves it. Three roles
//! exist — `api`, `experience`, `trainer` — each built from `MeltConfig`
//! so the canonical deployment comes out of the defaults.
//!
//! The command argument lists are the opaque toolkit's own CLI surface and
//! are preserved verbatim, including its mixed flag spellings
//! (`--lm-model-path` on the api binary, `--lm_model_path` on the UI).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MeltConfig, RoleConfig, parse_duration};
use crate::volume::VolumeKind;

#[derive(Debug, Error)]
pub enum RoleError {
    #[error("unknown role: {0:?} (expected api, experience, or trainer)")]
    UnknownName(String),
    #[error("invalid gpu spec for role {role}: {source}")]
    Gpu { role: RoleName, source: GpuSpecError },
    #[error("invalid startup_timeout for role {role}: {value:?}")]
    Timeout { role: RoleName, value: String },
}

#[derive(Debug, Error)]
pub enum GpuSpecError {
    #[error("gpu class is empty")]
    EmptyClass,
    #[error("invalid gpu count in {0:?}")]
    InvalidCount(String),
}

/// The three deployable service roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    Api,
    Experience,
    Trainer,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Api => "api",
            RoleName::Experience => "experience",
            RoleName::Trainer => "trainer",
        }
    }

    fn canonical(self) -> Canonical {
        match self {
            RoleName::Api => Canonical {
                port: 8001,
                gpu: "A100",
                max_concurrent: 20,
            },
            RoleName::Experience => Canonical {
                port: 7860,
                gpu: "A100",
                max_concurrent: 10,
            },
            RoleName::Trainer => Canonical {
                port: 7861,
                gpu: "A100:2",
                max_concurrent: 1,
            },
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(RoleName::Api),
            "experience" => Ok(RoleName::Experience),
            "trainer" => Ok(RoleName::Trainer),
            other => Err(RoleError::UnknownName(other.to_string())),
        }
    }
}

/// Startup deadline shared by every role unless the config overrides it.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(300);

/// Canonical deployment parameters for one role, applied wherever the
/// config section leaves a field unset.
struct Canonical {
    port: u16,
    gpu: &'static str,
    max_concurrent: u32,
}

/// GPU requirement in the platform's syntax: class with optional count
/// ("A100" means one, "A100:2" means two).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuSpec {
    pub class: String,
    pub count: u32,
}

impl GpuSpec {
    pub fn parse(s: &str) -> Result<Self, GpuSpecError> {
        let s = s.trim();
        let (class, count) = match s.split_once(':') {
            Some((class, count)) => {
                let count: u32 = count
                    .parse()
                    .ok()
                    .filter(|c| *c > 0)
                    .ok_or_else(|| GpuSpecError::InvalidCount(s.to_string()))?;
                (class, count)
            }
            None => (s, 1),
        };
        if class.is_empty() {
            return Err(GpuSpecError::EmptyClass);
        }
        Ok(Self {
            class: class.to_string(),
            count,
        })
    }
}

impl fmt::Display for GpuSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            f.write_str(&self.class)
        } else {
            write!(f, "{}:{}", self.class, self.count)
        }
    }
}

/// A fully specified deployable role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSpec {
    pub name: RoleName,
    pub gpu: GpuSpec,
    pub port: u16,
    /// Maximum concurrent requests per process instance. Declarative:
    /// enforcement belongs to the toolkit's own server.
    pub max_concurrent: u32,
    /// Deadline for the subprocess to bind its port.
    pub startup_timeout: Duration,
    /// Volumes this role mounts.
    pub mounts: Vec<VolumeKind>,
    /// Toolkit command, argv-style.
    pub command: Vec<String>,
}

impl RoleSpec {
    /// Build the spec for `name` from configuration.
    pub fn for_role(name: RoleName, config: &MeltConfig) -> Result<Self, RoleError> {
        match name {
            RoleName::Api => Self::api(config),
            RoleName::Experience => Self::experience(config),
            RoleName::Trainer => Self::trainer(config),
        }
    }

    /// REST generation API: models + outputs, one A100 by default.
    pub fn api(config: &MeltConfig) -> Result<Self, RoleError> {
        let params = RoleParams::resolve(RoleName::Api, &config.roles.api)?;
        let command = vec![
            "uv".to_string(),
            "run".to_string(),
            "acestep-api".to_string(),
            "--host".to_string(),
            "0.0.0.0".to_string(),
            "--port".to_string(),
            params.port.to_string(),
            "--lm-model-path".to_string(),
            config.registry.lm_model.clone(),
        ];
        Ok(params.into_spec(
            RoleName::Api,
            vec![VolumeKind::Models, VolumeKind::Outputs],
            command,
        ))
    }

    /// User-facing generation UI: models + outputs, one A100 by default.
    pub fn experience(config: &MeltConfig) -> Result<Self, RoleError> {
        let params = RoleParams::resolve(RoleName::Experience, &config.roles.experience)?;
        let command = vec![
            "uv".to_string(),
            "run".to_string(),
            "acestep".to_string(),
            "--server-name".to_string(),
            "0.0.0.0".to_string(),
            "--server-port".to_string(),
            params.port.to_string(),
            "--config_path".to_string(),
            config.registry.dit_config.clone(),
            "--lm_model_path".to_string(),
            config.registry.lm_model.clone(),
        ];
        Ok(params.into_spec(
            RoleName::Experience,
            vec![VolumeKind::Models, VolumeKind::Outputs],
            command,
        ))
    }

    /// LoRA fine-tuning UI: models + loras, two A100s by default.
    pub fn trainer(config: &MeltConfig) -> Result<Self, RoleError> {
        let params = RoleParams::resolve(RoleName::Trainer, &config.roles.trainer)?;
        let command = vec![
            "uv".to_string(),
            "run".to_string(),
            "acestep".to_string(),
            "--server-name".to_string(),
            "0.0.0.0".to_string(),
            "--server-port".to_string(),
            params.port.to_string(),
            "--train-mode".to_string(),
        ];
        Ok(params.into_spec(
            RoleName::Trainer,
            vec![VolumeKind::Models, VolumeKind::Loras],
            command,
        ))
    }

    pub fn mounts_volume(&self, kind: VolumeKind) -> bool {
        self.mounts.contains(&kind)
    }

    /// The command as a single shell-style line, for logs and reports.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Role parameters after canonical defaults fill the gaps in a config
/// section. Resolution runs before the command is assembled, so an
/// overridden port lands in the command line too.
struct RoleParams {
    gpu: GpuSpec,
    port: u16,
    max_concurrent: u32,
    startup_timeout: Duration,
}

impl RoleParams {
    fn resolve(name: RoleName, rc: &RoleConfig) -> Result<Self, RoleError> {
        let canonical = name.canonical();
        let gpu = GpuSpec::parse(rc.gpu.as_deref().unwrap_or(canonical.gpu))
            .map_err(|source| RoleError::Gpu { role: name, source })?;
        let startup_timeout = match &rc.startup_timeout {
            Some(value) => parse_duration(value).ok_or_else(|| RoleError::Timeout {
                role: name,
                value: value.clone(),
            })?,
            None => DEFAULT_STARTUP_TIMEOUT,
        };
        Ok(Self {
            gpu,
            port: rc.port.unwrap_or(canonical.port),
            max_concurrent: rc.max_concurrent.unwrap_or(canonical.max_concurrent),
            startup_timeout,
        })
    }

    fn into_spec(self, name: RoleName, mounts: Vec<VolumeKind>, command: Vec<String>) -> RoleSpec {
        RoleSpec {
            name,
            gpu: self.gpu,
            port: self.port,
            max_concurrent: self.max_concurrent,
            startup_timeout: self.startup_timeout,
            mounts,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> MeltConfig {
        MeltConfig::default()
    }

    #[test]
    fn role_names_round_trip() {
        for name in [RoleName::Api, RoleName::Experience, RoleName::Trainer] {
            assert_eq!(name.as_str().parse::<RoleName>().unwrap(), name);
        }
    }

    #[test]
    fn unknown_role_name_is_rejected() {
        assert!(matches!(
            "gateway".parse::<RoleName>(),
            Err(RoleError::UnknownName(_))
        ));
    }

    #[test]
    fn gpu_spec_parses_bare_class() {
        let gpu = GpuSpec::parse("A100").unwrap();
        assert_eq!(gpu.class, "A100");
        assert_eq!(gpu.count, 1);
        assert_eq!(gpu.to_string(), "A100");
    }

    #[test]
    fn gpu_spec_parses_class_with_count() {
        let gpu = GpuSpec::parse("A100:2").unwrap();
        assert_eq!(gpu.count, 2);
        assert_eq!(gpu.to_string(), "A100:2");
    }

    #[test]
    fn gpu_spec_rejects_zero_and_garbage_counts() {
        assert!(matches!(
            GpuSpec::parse("A100:0"),
            Err(GpuSpecError::InvalidCount(_))
        ));
        assert!(matches!(
            GpuSpec::parse("A100:two"),
            Err(GpuSpecError::InvalidCount(_))
        ));
        assert!(matches!(GpuSpec::parse(""), Err(GpuSpecError::EmptyClass)));
    }

    #[test]
    fn api_role_matches_canonical_deployment() {
        let spec = RoleSpec::api(&default_config()).unwrap();
        assert_eq!(spec.port, 8001);
        assert_eq!(spec.gpu, GpuSpec::parse("A100").unwrap());
        assert_eq!(spec.max_concurrent, 20);
        assert_eq!(spec.startup_timeout, Duration::from_secs(300));
        assert_eq!(spec.mounts, vec![VolumeKind::Models, VolumeKind::Outputs]);
        assert_eq!(
            spec.command_line(),
            "uv run acestep-api --host 0.0.0.0 --port 8001 --lm-model-path acestep-5Hz-lm-4B"
        );
    }

    #[test]
    fn experience_role_matches_canonical_deployment() {
        let spec = RoleSpec::experience(&default_config()).unwrap();
        assert_eq!(spec.port, 7860);
        assert_eq!(spec.max_concurrent, 10);
        assert_eq!(
            spec.command_line(),
            "uv run acestep --server-name 0.0.0.0 --server-port 7860 \
             --config_path acestep-v15-turbo --lm_model_path acestep-5Hz-lm-4B"
        );
    }

    #[test]
    fn trainer_role_mounts_loras_not_outputs() {
        let spec = RoleSpec::trainer(&default_config()).unwrap();
        assert_eq!(spec.port, 7861);
        assert_eq!(spec.gpu.count, 2);
        assert!(spec.mounts_volume(VolumeKind::Loras));
        assert!(!spec.mounts_volume(VolumeKind::Outputs));
        assert!(spec.command.contains(&"--train-mode".to_string()));
    }

    #[test]
    fn every_role_mounts_models() {
        let config = default_config();
        for name in [RoleName::Api, RoleName::Experience, RoleName::Trainer] {
            let spec = RoleSpec::for_role(name, &config).unwrap();
            assert!(spec.mounts_volume(VolumeKind::Models), "{name} lacks models");
        }
    }

    #[test]
    fn role_ports_are_distinct() {
        let config = default_config();
        let api = RoleSpec::api(&config).unwrap();
        let experience = RoleSpec::experience(&config).unwrap();
        let trainer = RoleSpec::trainer(&config).unwrap();
        assert_ne!(api.port, experience.port);
        assert_ne!(api.port, trainer.port);
        assert_ne!(experience.port, trainer.port);
    }

    #[test]
    fn config_overrides_flow_into_spec() {
        let mut config = default_config();
        config.roles.api.port = Some(9100);
        config.roles.api.gpu = Some("H100:4".to_string());
        config.roles.api.startup_timeout = Some("2m".to_string());
        config.registry.lm_model = "acestep-lm-custom".to_string();

        let spec = RoleSpec::api(&config).unwrap();
        assert_eq!(spec.port, 9100);
        assert_eq!(spec.gpu.count, 4);
        assert_eq!(spec.startup_timeout, Duration::from_secs(120));
        assert!(spec.command.contains(&"9100".to_string()));
        assert!(spec.command.contains(&"acestep-lm-custom".to_string()));
    }

    #[test]
    fn partial_override_keeps_canonical_values() {
        let config: MeltConfig = toml::from_str("[roles.api]\nport = 9100\n").unwrap();

        let spec = RoleSpec::api(&config).unwrap();
        assert_eq!(spec.port, 9100);
        assert_eq!(spec.gpu, GpuSpec::parse("A100").unwrap());
        assert_eq!(spec.max_concurrent, 20);
        assert_eq!(spec.startup_timeout, Duration::from_secs(300));
        assert!(spec.command.contains(&"9100".to_string()));
    }

    #[test]
    fn bad_gpu_config_surfaces_role_error() {
        let mut config = default_config();
        config.roles.trainer.gpu = Some("A100:zero".to_string());
        assert!(matches!(
            RoleSpec::trainer(&config),
            Err(RoleError::Gpu { role: RoleName::Trainer, .. })
        ));
    }

    #[test]
    fn bad_timeout_config_surfaces_role_error() {
        let mut config = default_config();
        config.roles.api.startup_timeout = Some("whenever".to_string());
        assert!(matches!(
            RoleSpec::api(&config),
            Err(RoleError::Timeout { role: RoleName::Api, .. })
        ));
    }
}

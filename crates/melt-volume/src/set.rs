//! VolumeSet — marked directories under a single volumes root.
//!
//! `get_or_create` is the provisioning primitive: it returns an existing
//! volume when the on-disk marker matches the requested name, creates the
//! directory and marker when the path is free, and refuses to touch anything
//! else. A non-directory at the path, a missing or corrupt marker, or a
//! marker naming a different volume are all fatal collisions.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use melt_core::VolumeKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProvisioningError, ProvisioningResult};

/// Name of the marker file written into every provisioned volume.
pub const MARKER_FILE: &str = "volume.toml";

/// Marker metadata stored inside each volume directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VolumeMarker {
    name: String,
    created_at: u64,
}

/// Handle to a provisioned (or planned) volume directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeHandle {
    pub name: String,
    pub path: PathBuf,
}

/// Provisioner for the durable volume directories under a single root.
#[derive(Debug, Clone)]
pub struct VolumeSet {
    root: PathBuf,
}

impl VolumeSet {
    /// Address a volume set rooted at `root` without touching the
    /// filesystem. Plan rendering uses this to derive paths.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the volume set rooted at `root`, creating the root if absent.
    pub fn open(root: impl Into<PathBuf>) -> ProvisioningResult<Self> {
        let set = Self::at(root);
        fs::create_dir_all(&set.root)?;
        debug!(root = %set.root.display(), "volume set opened");
        Ok(set)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The handle a volume would get, without touching the filesystem.
    /// Used by plan rendering.
    pub fn handle(&self, kind: VolumeKind) -> VolumeHandle {
        let name = kind.volume_name();
        VolumeHandle {
            path: self.root.join(&name),
            name,
        }
    }

    /// Idempotently provision the durable volume for `kind`.
    pub fn get_or_create(&self, kind: VolumeKind) -> ProvisioningResult<VolumeHandle> {
        self.get_or_create_named(&kind.volume_name())
    }

    /// As [`VolumeSet::get_or_create`], for a caller-supplied volume name.
    pub fn get_or_create_named(&self, name: &str) -> ProvisioningResult<VolumeHandle> {
        validate_name(name)?;
        let path = self.root.join(name);

        if path.exists() {
            if !path.is_dir() {
                return Err(ProvisioningError::Collision {
                    name: name.to_string(),
                    path,
                });
            }
            let marker = read_marker(&path).map_err(|reason| ProvisioningError::Marker {
                name: name.to_string(),
                reason,
            })?;
            if marker.name != name {
                return Err(ProvisioningError::Marker {
                    name: name.to_string(),
                    reason: format!("marker belongs to volume {:?}", marker.name),
                });
            }
            debug!(%name, path = %path.display(), "volume already provisioned");
            return Ok(VolumeHandle {
                name: name.to_string(),
                path,
            });
        }

        fs::create_dir_all(&path)?;
        write_marker(&path, name)?;
        info!(%name, path = %path.display(), "volume created");
        Ok(VolumeHandle {
            name: name.to_string(),
            path,
        })
    }
}

/// Volume names must be single path components so they cannot escape the
/// volumes root.
fn validate_name(name: &str) -> ProvisioningResult<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\');
    if ok {
        Ok(())
    } else {
        Err(ProvisioningError::InvalidName(name.to_string()))
    }
}

fn marker_path(volume: &Path) -> PathBuf {
    volume.join(MARKER_FILE)
}

fn read_marker(volume: &Path) -> Result<VolumeMarker, String> {
    let path = marker_path(volume);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err("directory exists but carries no marker".to_string());
        }
        Err(e) => return Err(format!("marker unreadable: {e}")),
    };
    toml::from_str(&raw).map_err(|e| format!("marker corrupt: {e}"))
}

fn write_marker(volume: &Path, name: &str) -> ProvisioningResult<()> {
    let marker = VolumeMarker {
        name: name.to_string(),
        created_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    };
    let raw = toml::to_string(&marker).map_err(|e| ProvisioningError::Marker {
        name: name.to_string(),
        reason: format!("marker serialization: {e}"),
    })?;
    fs::write(marker_path(volume), raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_set(dir: &tempfile::TempDir) -> VolumeSet {
        VolumeSet::open(dir.path().join("volumes")).unwrap()
    }

    // ── Provisioning ───────────────────────────────────────────────

    #[test]
    fn create_writes_directory_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        let vol = set.get_or_create(VolumeKind::Models).unwrap();
        assert_eq!(vol.name, "melt-c0r3-models");
        assert!(vol.path.is_dir());
        assert!(vol.path.join(MARKER_FILE).is_file());
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        let first = set.get_or_create(VolumeKind::Outputs).unwrap();
        let marker_before = fs::read_to_string(first.path.join(MARKER_FILE)).unwrap();

        let second = set.get_or_create(VolumeKind::Outputs).unwrap();
        assert_eq!(first, second);
        // Re-provisioning does not rewrite the marker.
        let marker_after = fs::read_to_string(second.path.join(MARKER_FILE)).unwrap();
        assert_eq!(marker_before, marker_after);
    }

    #[test]
    fn contents_survive_reprovisioning() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        let vol = set.get_or_create(VolumeKind::Loras).unwrap();
        fs::write(vol.path.join("adapter.safetensors"), b"weights").unwrap();

        let again = set.get_or_create(VolumeKind::Loras).unwrap();
        let data = fs::read(again.path.join("adapter.safetensors")).unwrap();
        assert_eq!(data, b"weights");
    }

    #[test]
    fn kinds_map_to_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        let models = set.get_or_create(VolumeKind::Models).unwrap();
        let loras = set.get_or_create(VolumeKind::Loras).unwrap();
        let outputs = set.get_or_create(VolumeKind::Outputs).unwrap();
        assert_ne!(models.path, loras.path);
        assert_ne!(models.path, outputs.path);
        assert_ne!(loras.path, outputs.path);
    }

    #[test]
    fn open_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("deep").join("volumes");
        let set = VolumeSet::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(set.root(), root);
    }

    #[test]
    fn handle_is_side_effect_free() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        let handle = set.handle(VolumeKind::Models);
        assert_eq!(handle.name, "melt-c0r3-models");
        assert!(!handle.path.exists());
    }

    #[test]
    fn at_does_not_create_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("volumes");

        let set = VolumeSet::at(&root);
        assert_eq!(set.handle(VolumeKind::Loras).path, root.join("melt-c0r3-loras"));
        assert!(!root.exists());
    }

    // ── Collisions ─────────────────────────────────────────────────

    #[test]
    fn file_at_volume_path_is_a_collision() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);
        fs::write(set.root().join("melt-c0r3-models"), b"not a dir").unwrap();

        let err = set.get_or_create(VolumeKind::Models).unwrap_err();
        assert!(matches!(err, ProvisioningError::Collision { .. }));
    }

    #[test]
    fn unmarked_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);
        fs::create_dir(set.root().join("melt-c0r3-outputs")).unwrap();

        let err = set.get_or_create(VolumeKind::Outputs).unwrap_err();
        assert!(matches!(err, ProvisioningError::Marker { .. }));
    }

    #[test]
    fn corrupt_marker_is_rejected_not_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        let vol = set.get_or_create(VolumeKind::Models).unwrap();
        fs::write(vol.path.join(MARKER_FILE), "][ not toml").unwrap();

        let err = set.get_or_create(VolumeKind::Models).unwrap_err();
        assert!(matches!(err, ProvisioningError::Marker { .. }));
        // Marker left exactly as found.
        let raw = fs::read_to_string(vol.path.join(MARKER_FILE)).unwrap();
        assert_eq!(raw, "][ not toml");
    }

    #[test]
    fn marker_for_another_volume_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        set.get_or_create_named("melt-c0r3-models").unwrap();
        fs::rename(
            set.root().join("melt-c0r3-models"),
            set.root().join("melt-c0r3-loras"),
        )
        .unwrap();

        let err = set.get_or_create(VolumeKind::Loras).unwrap_err();
        match err {
            ProvisioningError::Marker { reason, .. } => {
                assert!(reason.contains("melt-c0r3-models"), "reason: {reason}");
            }
            other => panic!("expected marker error, got {other:?}"),
        }
    }

    // ── Name validation ────────────────────────────────────────────

    #[test]
    fn invalid_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let set = open_set(&dir);

        for bad in ["", ".", "..", "a/b", "a\\b", "../escape"] {
            let err = set.get_or_create_named(bad).unwrap_err();
            assert!(
                matches!(err, ProvisioningError::InvalidName(_)),
                "{bad:?} should be invalid"
            );
        }
    }
}

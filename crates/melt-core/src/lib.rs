pub mod config;
pub mod image;
pub mod role;
pub mod volume;

pub use config::MeltConfig;
pub use image::ImageSpec;
pub use role::{GpuSpec, RoleName, RoleSpec};
pub use volume::VolumeKind;

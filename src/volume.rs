//! Backup volume descriptors and their resolution against the mount table.

use std::fmt;

use log::debug;
use serde::Deserialize;

use crate::error::VolumeError;

/// Identifies the volume to back up to.
///
/// When several attributes are set, only the most precise one is used:
/// `mount_path`, then `device`, then `name`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeDescriptor {
    /// Volume label, compared with the last segment of each mount point.
    /// Only reliable on macOS, where volumes mount under `/Volumes/<label>`.
    #[serde(default)]
    pub name: Option<String>,
    /// Device path, e.g. `/dev/sda1` (Linux) or `/dev/disk5s1` (macOS).
    #[serde(default)]
    pub device: Option<String>,
    /// Exact mount point of the volume.
    #[serde(default, alias = "mountPath")]
    pub mount_path: Option<String>,
}

impl VolumeDescriptor {
    pub fn by_mount_path(mount_path: impl Into<String>) -> Self {
        Self {
            mount_path: Some(mount_path.into()),
            ..Self::default()
        }
    }

    pub fn by_device(device: impl Into<String>) -> Self {
        Self {
            device: Some(device.into()),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The match strategy used for this descriptor: the first non-empty
    /// attribute in precedence order.
    pub fn strategy(&self) -> Option<VolumeMatch<'_>> {
        [
            self.mount_path.as_deref().map(VolumeMatch::MountPath),
            self.device.as_deref().map(VolumeMatch::Device),
            self.name.as_deref().map(VolumeMatch::Name),
        ]
        .into_iter()
        .flatten()
        .find(|strategy| !strategy.value().is_empty())
    }
}

/// A single way of matching a mount record, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeMatch<'a> {
    MountPath(&'a str),
    Device(&'a str),
    Name(&'a str),
}

impl VolumeMatch<'_> {
    fn value(&self) -> &str {
        match self {
            VolumeMatch::MountPath(v) | VolumeMatch::Device(v) | VolumeMatch::Name(v) => v,
        }
    }

    pub fn matches(&self, mount: &MountRecord) -> bool {
        match *self {
            VolumeMatch::MountPath(path) => mount.mount_point == path,
            VolumeMatch::Device(device) => mount.device == device,
            VolumeMatch::Name(name) => mount.volume_name() == name,
        }
    }
}

impl fmt::Display for VolumeMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeMatch::MountPath(v) => write!(f, "mount path {v:?}"),
            VolumeMatch::Device(v) => write!(f, "device {v:?}"),
            VolumeMatch::Name(v) => write!(f, "volume name {v:?}"),
        }
    }
}

/// One entry of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub mount_point: String,
    pub device: String,
}

impl MountRecord {
    pub fn new(mount_point: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            mount_point: mount_point.into(),
            device: device.into(),
        }
    }

    pub fn volume_name(&self) -> &str {
        volume_name(&self.mount_point)
    }
}

/// Derives a volume name from a mount point: its last `/`-separated segment.
///
/// This is a heuristic. `/Volumes/Backup` yields `Backup`, `/` yields an
/// empty name.
pub fn volume_name(mount_point: &str) -> &str {
    mount_point.rsplit('/').next().unwrap_or_default()
}

/// Finds the first mount record matching `descriptor`.
///
/// # Errors
/// [`VolumeError::InvalidDescriptor`] if the descriptor sets no attribute,
/// [`VolumeError::NotFound`] if no mount matches.
pub fn resolve_volume<'m>(
    descriptor: &VolumeDescriptor,
    mounts: &'m [MountRecord],
) -> Result<&'m MountRecord, VolumeError> {
    let strategy = descriptor.strategy().ok_or(VolumeError::InvalidDescriptor)?;
    debug!("looking up {strategy} among {} mounts", mounts.len());

    mounts
        .iter()
        .find(|mount| strategy.matches(mount))
        .inspect(|mount| debug!("matched {} on {}", mount.device, mount.mount_point))
        .ok_or_else(|| VolumeError::NotFound(strategy.to_string()))
}

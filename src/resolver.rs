//! Turns a [`RawConfig`] into a validated [`ResolvedConfig`].

use std::path::{Component, Path, PathBuf};

use log::{info, warn};

use crate::config::{PathEntry, RawConfig};
use crate::error::ResolveError;
use crate::permissions::ProcessIdentity;
use crate::validate::validate_paths;
use crate::volume::{MountRecord, resolve_volume};

/// A validated configuration, ready to be turned into a sync plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    include_paths: Vec<PathEntry>,
    exclude_paths: Vec<PathEntry>,
    volume_root: Option<PathBuf>,
    backup_directory: PathBuf,
}

impl ResolvedConfig {
    pub fn include_paths(&self) -> &[PathEntry] {
        &self.include_paths
    }

    pub fn exclude_paths(&self) -> &[PathEntry] {
        &self.exclude_paths
    }

    /// Mount point of the backup volume, `None` when the volume could not be
    /// found and validation was skipped.
    pub fn volume_root(&self) -> Option<&Path> {
        self.volume_root.as_deref()
    }

    pub fn backup_directory(&self) -> &Path {
        &self.backup_directory
    }

    /// Whether the backup volume was left unresolved.
    pub fn is_degraded(&self) -> bool {
        self.volume_root.is_none()
    }
}

/// Resolves configurations against a fixed mount snapshot and identity.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    mounts: Vec<MountRecord>,
    identity: ProcessIdentity,
}

impl ConfigResolver {
    pub fn new(mounts: Vec<MountRecord>, identity: ProcessIdentity) -> Self {
        Self { mounts, identity }
    }

    /// Validates `raw` and computes the backup directory.
    ///
    /// A missing backup volume or an empty include list is always an error.
    /// `skip_validation` only suppresses path checks and volume lookup
    /// failures. When the volume is not found the result is degraded: it has
    /// no volume root and the backup directory is `backup_dir` alone.
    ///
    /// # Errors
    /// See [`ResolveError`].
    pub fn resolve(
        &self,
        raw: RawConfig,
        skip_validation: bool,
    ) -> Result<ResolvedConfig, ResolveError> {
        let descriptor = raw.backup_volume.ok_or(ResolveError::MissingBackupVolume)?;
        if raw.include.is_empty() {
            return Err(ResolveError::EmptyInclude);
        }

        if !skip_validation {
            validate_paths(&raw.include, &self.identity).map_err(ResolveError::ValidationFailed)?;
        }

        let volume_root = match resolve_volume(&descriptor, &self.mounts) {
            Ok(mount) => Some(PathBuf::from(&mount.mount_point)),
            Err(e) if skip_validation => {
                warn!("ignoring backup volume error: {e}");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let root = volume_root.as_deref().unwrap_or_else(|| Path::new(""));
        let backup_directory = backup_directory(root, &raw.backup_dir);
        info!("backing up to {}", backup_directory.display());

        Ok(ResolvedConfig {
            include_paths: raw.include,
            exclude_paths: raw.exclude,
            volume_root,
            backup_directory,
        })
    }
}

/// Joins `backup_dir` onto the volume root; an empty `backup_dir` is the root
/// itself. `backup_dir` is always treated as relative.
///
/// The joined path is cleaned lexically: `.` segments and trailing
/// separators are dropped and `..` removes the preceding segment.
pub fn backup_directory(root: &Path, backup_dir: &str) -> PathBuf {
    let backup_dir = backup_dir.trim_start_matches('/');
    if backup_dir.is_empty() {
        root.to_path_buf()
    } else {
        clean(&root.join(backup_dir))
    }
}

fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last().copied() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }
    parts.iter().collect()
}

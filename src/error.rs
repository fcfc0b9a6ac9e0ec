//! Error types shared by the resolution pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while inspecting a path or the identity of the running process.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("unable to inspect '{}'", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to determine the current user: {0}")]
    Identity(String),
}

impl PermissionError {
    /// Whether this is a stat failure caused by the path not existing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PermissionError::Stat { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

/// Failures while matching a volume descriptor against the mount table.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("volume descriptor must set one of `mount_path`, `device` or `name`")]
    InvalidDescriptor,
    #[error("no mounted volume matches {0}")]
    NotFound(String),
    #[error("unable to read the mount table")]
    MountTable(#[source] io::Error),
}

/// A single problem with an include path.
#[derive(Debug, Error)]
pub enum PathIssue {
    #[error("path {} could not be inspected: {cause}", .path.display())]
    Inaccessible {
        path: PathBuf,
        cause: io::Error,
    },
    #[error("path {} is not readable by the current user or group", .path.display())]
    Unreadable { path: PathBuf },
    #[error("path {} is a directory but `recursive` was set to false", .path.display())]
    DirectoryNotRecursive { path: PathBuf },
}

/// Errors returned by [`crate::resolver::ConfigResolver::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("must provide a configuration for the backup volume to use")]
    MissingBackupVolume,
    #[error("field `include` cannot be empty")]
    EmptyInclude,
    #[error("{} validation error(s) were found in `include`", .0.len())]
    ValidationFailed(Vec<PathIssue>),
    #[error("error resolving the backup volume")]
    Volume(#[from] VolumeError),
}

impl ResolveError {
    /// Every path issue carried by a `ValidationFailed` error, in input order.
    pub fn issues(&self) -> &[PathIssue] {
        match self {
            ResolveError::ValidationFailed(issues) => issues,
            _ => &[],
        }
    }
}

/// Errors while locating, reading or decoding a config file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't get the home directory")]
    NoHomeDir,
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(
        "it looks like rsync-daemon doesn't have permission to read {}; please check the file permissions and try again",
        .0.display()
    )]
    Unreadable(PathBuf),
    #[error("error reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0:?} is not a supported file extension for config")]
    UnsupportedFormat(String),
    #[error("error parsing YAML config")]
    Yaml(#[from] serde_yaml::Error),
    #[error("error parsing JSON config")]
    Json(#[from] serde_json::Error),
    #[error("error parsing TOML config")]
    Toml(#[from] toml::de::Error),
}

/// Errors from running the external sync program.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to launch {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("syncing {} failed ({}): {stderr}", .path.display(), exit_description(.code))]
    Failed {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("unable to start the sync runtime")]
    Runtime(#[source] io::Error),
    #[error("sync task panicked or was cancelled")]
    Join(#[from] tokio::task::JoinError),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

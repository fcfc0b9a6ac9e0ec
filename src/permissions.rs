//! Read/write permission inference for filesystem entries.
//!
//! Permissions are derived from the nine mode bits of an entry together with
//! the uid/gid of the running process. The owner triplet applies when the
//! process owns the entry, the group triplet applies when the process' primary
//! group owns it.
//!
//! Entries owned by neither are reported as neither readable nor writable;
//! the "other" triplet is never consulted.

use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::PermissionError;

/// Result of a permission query for a single entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionSnapshot {
    /// Is this path readable by the current user?
    pub readable: bool,
    /// Is this path writable by the current user?
    pub writable: bool,
}

/// The uid/gid pair permissions are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl ProcessIdentity {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Returns the real uid and gid of the running process.
    #[cfg(unix)]
    pub fn current() -> Result<Self, PermissionError> {
        Ok(Self {
            uid: rustix::process::getuid().as_raw(),
            gid: rustix::process::getgid().as_raw(),
        })
    }

    /// Returns the real uid and gid of the running process.
    #[cfg(not(unix))]
    pub fn current() -> Result<Self, PermissionError> {
        Err(PermissionError::Identity(
            "process ownership is only available on unix platforms".to_string(),
        ))
    }
}

/// The subset of stat information needed for permission inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub is_dir: bool,
}

impl EntryMetadata {
    #[cfg(unix)]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            is_dir: metadata.is_dir(),
        }
    }

    /// Stats `path`, following symlinks.
    ///
    /// # Errors
    /// Returns [`PermissionError::Stat`] if the path cannot be inspected.
    #[cfg(unix)]
    pub fn stat(path: &Path) -> Result<Self, PermissionError> {
        fs::metadata(path)
            .map(|metadata| Self::from_metadata(&metadata))
            .map_err(|source| PermissionError::Stat {
                path: path.to_path_buf(),
                source,
            })
    }

    #[cfg(not(unix))]
    pub fn stat(path: &Path) -> Result<Self, PermissionError> {
        Err(PermissionError::Stat {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix ownership information is unavailable on this platform",
            ),
        })
    }
}

/// Which triplet of the mode bits to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Owner,
    Group,
    Other,
}

impl Class {
    fn shift(self) -> u32 {
        match self {
            Class::Owner => 6,
            Class::Group => 3,
            Class::Other => 0,
        }
    }
}

/// Read, write and execute flags of one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triplet {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

/// The nine permission bits of a file mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeBits(u32);

impl ModeBits {
    pub fn from_mode(mode: u32) -> Self {
        Self(mode & 0o777)
    }

    pub fn triplet(self, class: Class) -> Triplet {
        let bits = (self.0 >> class.shift()) & 0o7;
        Triplet {
            read: bits & 0o4 != 0,
            write: bits & 0o2 != 0,
            execute: bits & 0o1 != 0,
        }
    }
}

impl fmt::Display for ModeBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in [Class::Owner, Class::Group, Class::Other] {
            let t = self.triplet(class);
            let r = if t.read { 'r' } else { '-' };
            let w = if t.write { 'w' } else { '-' };
            let x = if t.execute { 'x' } else { '-' };
            write!(f, "{r}{w}{x}")?;
        }
        Ok(())
    }
}

/// Infers permissions from pre-loaded metadata.
pub fn resolve_by_metadata(
    entry: &EntryMetadata,
    identity: &ProcessIdentity,
) -> PermissionSnapshot {
    let bits = ModeBits::from_mode(entry.mode);
    let class = if entry.uid == identity.uid {
        Class::Owner
    } else if entry.gid == identity.gid {
        Class::Group
    } else {
        debug!(
            "entry owned by {}:{} is outside {}:{}, treating {bits} as inaccessible",
            entry.uid, entry.gid, identity.uid, identity.gid
        );
        return PermissionSnapshot::default();
    };

    let triplet = bits.triplet(class);
    PermissionSnapshot {
        readable: triplet.read,
        writable: triplet.write,
    }
}

/// Stats `path` and infers its permissions.
///
/// # Errors
/// Returns [`PermissionError::Stat`] if the path cannot be inspected.
pub fn resolve_by_path(
    path: &Path,
    identity: &ProcessIdentity,
) -> Result<PermissionSnapshot, PermissionError> {
    let entry = EntryMetadata::stat(path)?;
    Ok(resolve_by_metadata(&entry, identity))
}

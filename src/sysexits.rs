//! Exit status codes, following BSD sysexits.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&apropos=0&sektion=0&manpath=FreeBSD+11.2-stable&arch=default&format=html)

use rsync_daemon::error::{LoadError, PermissionError, ResolveError, SyncError, VolumeError};

/// value: 1 <br>
/// Any failure not covered by a more specific code.
pub const EX_FAILURE: i32 = 1;

/// value: 64 <br>
/// The command was used incorrectly, e.g. no subcommand was given.
pub const EX_USAGE: i32 = 64;

/// value: 65 <br>
/// The config file could not be decoded.
pub const EX_DATAERR: i32 = 65;

/// value: 66 <br>
/// The config file did not exist or was not readable.
pub const EX_NOINPUT: i32 = 66;

/// value: 69 <br>
/// rsync could not be launched or reported a failure.
pub const EX_UNAVAILABLE: i32 = 69;

/// value: 71 <br>
/// The current user or the mount table could not be determined.
pub const EX_OSERR: i32 = 71;

/// value: 74 <br>
/// An error occurred while reading the config file.
pub const EX_IOERR: i32 = 74;

/// value: 78 <br>
/// The configuration is incomplete or failed validation.
pub const EX_CONFIG: i32 = 78;

/// Picks the exit code for the first recognised error in the chain.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.is::<ResolveError>() {
            return EX_CONFIG;
        }
        if let Some(e) = cause.downcast_ref::<LoadError>() {
            return match e {
                LoadError::NoHomeDir | LoadError::Permission(PermissionError::Identity(_)) => {
                    EX_OSERR
                }
                LoadError::Permission(_) | LoadError::Unreadable(_) => EX_NOINPUT,
                LoadError::Io { .. } => EX_IOERR,
                LoadError::UnsupportedFormat(_)
                | LoadError::Yaml(_)
                | LoadError::Json(_)
                | LoadError::Toml(_) => EX_DATAERR,
            };
        }
        if cause.is::<SyncError>() {
            return EX_UNAVAILABLE;
        }
        if cause.is::<VolumeError>() || cause.is::<PermissionError>() {
            return EX_OSERR;
        }
    }
    EX_FAILURE
}

//! Builds the list of rsync transfers for a resolved configuration.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::resolver::ResolvedConfig;

/// Flags passed to rsync for every transfer.
pub const DEFAULT_RSYNC_ARGS: [&str; 3] = ["--ignore-existing", "--update", "--prune-empty-dirs"];

/// One rsync invocation: copy `source` into `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInstruction {
    pub source: PathBuf,
    pub recursive: bool,
    pub destination: PathBuf,
}

impl TransferInstruction {
    /// Command-line arguments for rsync, program name excluded.
    pub fn rsync_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = DEFAULT_RSYNC_ARGS.into_iter().map(OsString::from).collect();
        if self.recursive {
            args.push("--recursive".into());
        }
        args.push(self.source.clone().into_os_string());
        args.push(self.destination.clone().into_os_string());
        args
    }
}

impl fmt::Display for TransferInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.display(), self.destination.display())?;
        if self.recursive {
            write!(f, " (recursive)")?;
        }
        Ok(())
    }
}

/// Builds one instruction per include path, in configuration order.
pub fn build_plan(config: &ResolvedConfig) -> Vec<TransferInstruction> {
    config
        .include_paths()
        .iter()
        .map(|entry| TransferInstruction {
            source: entry.path.clone(),
            recursive: entry.recursive,
            destination: config.backup_directory().to_path_buf(),
        })
        .collect()
}

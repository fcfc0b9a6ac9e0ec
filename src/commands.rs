//! Command-line interface definition for rsync-daemon.
//!
//! Every command starts the same way: locate and load the config file,
//! snapshot the mount table and resolve the configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use rsync_daemon::config::{ConfigPaths, load_config};
use rsync_daemon::error::ResolveError;
use rsync_daemon::mounts::mounted_volumes;
use rsync_daemon::path_util::expand_home;
use rsync_daemon::permissions::ProcessIdentity;
use rsync_daemon::plan::build_plan;
use rsync_daemon::resolver::{ConfigResolver, ResolvedConfig};
use rsync_daemon::sync::{RSYNC, run_plan, run_plan_parallel};

/// Command-line interface definition for rsync-daemon.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Path to a config file to override the default `~/.rsyncdaemoncfg.yaml`.
    /// If a directory is passed, `.rsyncdaemoncfg.yaml` is expected inside it.
    /// A file may be YAML, JSON or TOML and must carry the matching extension.
    #[arg(short, long, global = true)]
    pub config: Option<String>,
    /// Ignore all config validation errors. Not recommended.
    #[arg(long, global = true)]
    pub ignore_validation: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    pub commands: Option<Commands>,
}

/// Supported rsync-daemon commands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Resolve the configuration and print the sync plan.
    Check,
    /// Resolve the configuration and sync every include path to the backup volume.
    Run {
        /// Run all transfers at once instead of one after another.
        #[arg(short, long)]
        parallel: bool,
        /// The rsync program to invoke.
        #[arg(long, default_value = RSYNC)]
        rsync: PathBuf,
    },
    /// List mounted volumes with the names a volume descriptor can match.
    Volumes,
}

/// Resolves the configuration and prints one line per transfer.
pub(crate) fn check(config: Option<&str>, ignore_validation: bool) -> Result<()> {
    let resolved = resolve(config, ignore_validation)?;
    let plan = build_plan(&resolved);

    match resolved.volume_root() {
        Some(root) => println!("backup volume: {}", root.display()),
        None => println!("backup volume: unresolved"),
    }
    println!("backup directory: {}", resolved.backup_directory().display());
    for instruction in plan {
        println!("{instruction}");
    }
    Ok(())
}

/// Resolves the configuration and runs rsync for every include path.
///
/// # Errors
/// Returns an error if resolution fails or any transfer fails. Sequential
/// runs stop at the first failing transfer.
pub(crate) fn run(
    config: Option<&str>,
    ignore_validation: bool,
    parallel: bool,
    rsync: &Path,
) -> Result<()> {
    let resolved = resolve(config, ignore_validation)?;
    if resolved.is_degraded() {
        warn!(
            "backup volume is unresolved, syncing to {}",
            resolved.backup_directory().display()
        );
    }

    let plan = build_plan(&resolved);
    let count = plan.len();
    let result = if parallel {
        run_plan_parallel(plan, rsync.as_os_str())
    } else {
        run_plan(&plan, rsync.as_os_str())
    };
    result.context("Failed to sync")?;

    println!(
        "Synced {count} path(s) to {}",
        resolved.backup_directory().display()
    );
    Ok(())
}

/// Prints the mount table as `device`, `mount point` and derived volume name.
pub(crate) fn volumes() -> Result<()> {
    let mounts = mounted_volumes()?;
    for mount in &mounts {
        println!(
            "{}\t{}\t{}",
            mount.device,
            mount.mount_point,
            mount.volume_name()
        );
    }
    Ok(())
}

fn resolve(config: Option<&str>, ignore_validation: bool) -> Result<ResolvedConfig> {
    let paths = ConfigPaths::from_home()?;
    let requested = config.map(expand_home);
    let config_file = paths.locate(requested.as_deref());

    let identity = ProcessIdentity::current()?;
    let raw = load_config(&config_file, &identity)
        .with_context(|| format!("Error loading config {}", config_file.display()))?;

    let mounts = match mounted_volumes() {
        Ok(mounts) => mounts,
        Err(e) if ignore_validation => {
            warn!("{e}");
            vec![]
        }
        Err(e) => return Err(e.into()),
    };

    ConfigResolver::new(mounts, identity)
        .resolve(raw, ignore_validation)
        .inspect_err(report_issues)
        .context("Error validating config")
}

fn report_issues(err: &ResolveError) {
    if err.issues().is_empty() {
        return;
    }
    eprintln!("----Validation errors in config.include----");
    for issue in err.issues() {
        eprintln!("{issue}");
    }
}

//! Runs a sync plan through the external rsync program.

use std::ffi::{OsStr, OsString};
use std::process::{Command, Output};

use log::{debug, info};
use tokio::runtime::Builder;
use tokio::task::JoinSet;

use crate::error::SyncError;
use crate::plan::TransferInstruction;

/// The program invoked when none is configured.
pub const RSYNC: &str = "rsync";

/// Runs each instruction in order, stopping at the first failure.
pub fn run_plan(plan: &[TransferInstruction], program: &OsStr) -> Result<(), SyncError> {
    for instruction in plan {
        info!("syncing {instruction}");
        let output = Command::new(program)
            .args(instruction.rsync_args())
            .output()
            .map_err(|source| spawn_error(program, source))?;
        check_output(instruction, &output)?;
    }
    Ok(())
}

/// Runs every instruction concurrently.
///
/// All instructions run to completion; the failure of the earliest
/// instruction in plan order is returned.
pub fn run_plan_parallel(plan: Vec<TransferInstruction>, program: &OsStr) -> Result<(), SyncError> {
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SyncError::Runtime)?;
    rt.block_on(run_all(plan, program.to_os_string()))
}

async fn run_all(plan: Vec<TransferInstruction>, program: OsString) -> Result<(), SyncError> {
    let mut set = JoinSet::new();
    for (index, instruction) in plan.into_iter().enumerate() {
        let program = program.clone();
        set.spawn(async move {
            info!("syncing {instruction}");
            let result = tokio::process::Command::new(&program)
                .args(instruction.rsync_args())
                .output()
                .await
                .map_err(|source| spawn_error(&program, source))
                .and_then(|output| check_output(&instruction, &output));
            (index, result)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (index, result) = joined?;
        if let Err(e) = result {
            debug!("instruction {index} failed: {e}");
            failures.push((index, e));
        }
    }
    failures.sort_by_key(|(index, _)| *index);
    match failures.into_iter().next() {
        Some((_, e)) => Err(e),
        None => Ok(()),
    }
}

fn spawn_error(program: &OsStr, source: std::io::Error) -> SyncError {
    SyncError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    }
}

fn check_output(instruction: &TransferInstruction, output: &Output) -> Result<(), SyncError> {
    if output.status.success() {
        return Ok(());
    }
    Err(SyncError::Failed {
        path: instruction.source.clone(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan() -> Vec<TransferInstruction> {
        ["/src/a", "/src/b"]
            .into_iter()
            .map(|source| TransferInstruction {
                source: PathBuf::from(source),
                recursive: true,
                destination: PathBuf::from("/dest"),
            })
            .collect()
    }

    #[test]
    fn test_run_plan() {
        assert!(run_plan(&plan(), OsStr::new("true")).is_ok());
        assert!(run_plan(&[], OsStr::new("false")).is_ok());
    }

    #[test]
    fn test_run_plan_failure() {
        let err = run_plan(&plan(), OsStr::new("false")).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Failed { ref path, code: Some(1), .. } if path == &PathBuf::from("/src/a")
        ));
    }

    #[test]
    fn test_run_plan_missing_program() {
        let err = run_plan(&plan(), OsStr::new("/nonexistent/rsync")).unwrap_err();
        assert!(matches!(err, SyncError::Spawn { .. }));
    }

    #[test]
    fn test_run_plan_parallel() {
        assert!(run_plan_parallel(plan(), OsStr::new("true")).is_ok());

        let err = run_plan_parallel(plan(), OsStr::new("false")).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Failed { ref path, .. } if path == &PathBuf::from("/src/a")
        ));
    }
}

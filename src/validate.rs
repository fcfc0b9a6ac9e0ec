//! Accessibility checks for include paths.

use std::io;

use log::warn;

use crate::config::PathEntry;
use crate::error::{PathIssue, PermissionError};
use crate::permissions::{EntryMetadata, ProcessIdentity, resolve_by_metadata};

/// Checks every entry and collects all problems in input order.
///
/// Paths that do not exist are skipped, so a missing include never fails
/// validation. An existing path must be readable, and a directory must be
/// marked `recursive`.
pub fn validate_paths(
    entries: &[PathEntry],
    identity: &ProcessIdentity,
) -> Result<(), Vec<PathIssue>> {
    let mut issues = Vec::new();

    for entry in entries {
        let path = &entry.path;
        let metadata = match EntryMetadata::stat(path) {
            Ok(metadata) => metadata,
            Err(e) if e.is_not_found() => {
                warn!("include path {} does not exist, skipping", path.display());
                continue;
            }
            Err(PermissionError::Stat { source, .. }) => {
                issues.push(PathIssue::Inaccessible {
                    path: path.clone(),
                    cause: source,
                });
                continue;
            }
            Err(e) => {
                issues.push(PathIssue::Inaccessible {
                    path: path.clone(),
                    cause: io::Error::other(e),
                });
                continue;
            }
        };

        if !resolve_by_metadata(&metadata, identity).readable {
            issues.push(PathIssue::Unreadable { path: path.clone() });
        }
        if metadata.is_dir && !entry.recursive {
            issues.push(PathIssue::DirectoryNotRecursive { path: path.clone() });
        }
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn identity() -> ProcessIdentity {
        ProcessIdentity::current().unwrap()
    }

    #[test]
    fn test_missing_paths_are_skipped() {
        let dir = TempDir::new().unwrap();
        let entries = [
            PathEntry::new(dir.path().join("nope"), false),
            PathEntry::new(dir.path().join("nope/deeper"), true),
        ];
        assert!(validate_paths(&entries, &identity()).is_ok());
    }

    #[test]
    fn test_valid_paths() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"a").unwrap();
        let entries = [
            PathEntry::new(dir.path(), true),
            PathEntry::new(&file, false),
            PathEntry::new(&file, true),
        ];
        assert!(validate_paths(&entries, &identity()).is_ok());
    }

    #[test]
    fn test_directory_without_recursion() {
        let dir = TempDir::new().unwrap();
        let issues = validate_paths(&[PathEntry::new(dir.path(), false)], &identity()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            &issues[0],
            PathIssue::DirectoryNotRecursive { path } if path == dir.path()
        ));
    }

    #[test]
    fn test_collects_every_issue_in_order() {
        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked.txt");
        fs::write(&locked, b"secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o200)).unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let entries = [
            PathEntry::new(&sub, false),
            PathEntry::new(dir.path().join("missing"), false),
            PathEntry::new(&locked, false),
            PathEntry::new(dir.path(), true),
        ];
        let issues = validate_paths(&entries, &identity()).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(matches!(&issues[0], PathIssue::DirectoryNotRecursive { path } if *path == sub));
        assert!(matches!(&issues[1], PathIssue::Unreadable { path } if *path == locked));
    }

    #[test]
    fn test_unreadable_directory_reports_both() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o300)).unwrap();

        let issues = validate_paths(&[PathEntry::new(&sub, false)], &identity()).unwrap_err();
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o700)).unwrap();
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], PathIssue::Unreadable { .. }));
        assert!(matches!(issues[1], PathIssue::DirectoryNotRecursive { .. }));
    }
}

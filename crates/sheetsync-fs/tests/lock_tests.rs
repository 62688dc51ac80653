//! Advisory project lock behavior

use sheetsync_fs::{Error, NormalizedPath, ProjectLock};
use tempfile::tempdir;

#[test]
fn test_second_lock_on_same_project_fails_fast() {
    let dir = tempdir().unwrap();
    let project = NormalizedPath::new(dir.path());

    let first = ProjectLock::acquire(&project).unwrap();
    let second = ProjectLock::acquire(&project);

    assert!(matches!(second, Err(Error::ProjectBusy { .. })));
    drop(first);
}

#[test]
fn test_lock_released_on_drop() {
    let dir = tempdir().unwrap();
    let project = NormalizedPath::new(dir.path());

    {
        let _lock = ProjectLock::acquire(&project).unwrap();
    }

    let again = ProjectLock::acquire(&project);
    assert!(again.is_ok());
}

#[test]
fn test_lock_file_lives_in_project_dir() {
    let dir = tempdir().unwrap();
    let project = NormalizedPath::new(dir.path());

    let lock = ProjectLock::acquire(&project).unwrap();
    assert!(lock.path().as_str().ends_with("/lock"));
    assert!(lock.path().exists());
}

//! Advisory lock serializing mutating commands on one project

use std::fs::{File, OpenOptions};

use fs2::FileExt;

use crate::{Error, NormalizedPath, ProjectPath, Result};

/// Exclusive advisory lock on `<project dir>/lock`.
///
/// Held for the lifetime of the value; dropping it releases the lock.
/// Acquisition never blocks: a second sync command against the same project
/// fails immediately with [`Error::ProjectBusy`].
#[derive(Debug)]
pub struct ProjectLock {
    file: File,
    path: NormalizedPath,
}

impl ProjectLock {
    /// Try to take the lock for the project directory `project_dir`.
    pub fn acquire(project_dir: &NormalizedPath) -> Result<Self> {
        let path = project_dir.join(ProjectPath::Lock.as_str());
        let native = path.to_native();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&native)
            .map_err(|e| Error::io(&native, e))?;

        file.try_lock_exclusive().map_err(|_| Error::ProjectBusy {
            path: project_dir.to_native(),
        })?;
        tracing::debug!(lock = %path, "Acquired project lock");

        Ok(Self { file, path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release project lock {}: {}", self.path, e);
        }
    }
}

//! Per-invocation project context
//!
//! Everything an operation needs (project root, manifest store, config,
//! remote handle) is gathered once into a [`ProjectContext`] and passed
//! explicitly. Mutating operations also hold the project lock for the
//! lifetime of the context.

use std::collections::BTreeSet;
use std::path::Path;

use sheetsync_fs::{NormalizedPath, ProjectLock, ProjectPath};

use crate::config::ProjectConfig;
use crate::manifest::{ManifestStore, SheetRecord};
use crate::naming::{cache_file_name, cache_stem};
use crate::remote::{FileSpreadsheet, Spreadsheet};
use crate::{Error, Result};

/// Whether to take the project lock when opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    Exclusive,
}

pub struct ProjectContext {
    root: NormalizedPath,
    store: ManifestStore,
    config: ProjectConfig,
    remote: Box<dyn Spreadsheet>,
    _lock: Option<ProjectLock>,
}

impl std::fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContext")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProjectContext {
    /// Find the project root: the closest ancestor of `start` containing a
    /// `.sheetsync` directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no ancestor is a project.
    pub fn discover(start: &Path) -> Result<NormalizedPath> {
        let start = absolute_path(start);
        for dir in start.ancestors() {
            if dir.join(ProjectPath::ProjectDir.as_str()).is_dir() {
                return Ok(NormalizedPath::new(dir));
            }
        }
        Err(Error::config(format!(
            "{} is not inside a sheetsync project (run `sheetsync init` first)",
            start.display()
        )))
    }

    /// Open the project at `root` with an explicit remote.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the manifest is incomplete or the remote is a
    ///   different spreadsheet than the one the project was initialized with
    /// - [`Error::Conflict`] if `access` is exclusive and another command
    ///   holds the lock
    pub fn open(root: NormalizedPath, remote: Box<dyn Spreadsheet>, access: Access) -> Result<Self> {
        let store = ManifestStore::new(root.join(ProjectPath::ProjectDir.as_str()));
        store.validate()?;
        let config = ProjectConfig::load(&store.path(ProjectPath::Config))?;

        let lock = match access {
            Access::ReadOnly => None,
            Access::Exclusive => Some(ProjectLock::acquire(store.dir()).map_err(|e| match e {
                sheetsync_fs::Error::ProjectBusy { .. } => Error::conflict(
                    "Another sheetsync command is running in this project",
                ),
                other => other.into(),
            })?),
        };

        let remote_id = remote.spreadsheet_id()?;
        if remote_id != config.spreadsheet_id {
            return Err(Error::config(format!(
                "Remote spreadsheet '{}' is not this project's spreadsheet '{}'",
                remote_id, config.spreadsheet_id
            )));
        }

        tracing::debug!(root = %root, title = %config.title, "Opened project");
        Ok(Self {
            root,
            store,
            config,
            remote,
            _lock: lock,
        })
    }

    /// Open the project using the file-backed remote named in its config.
    pub fn open_with_file_remote(root: NormalizedPath, access: Access) -> Result<Self> {
        let store = ManifestStore::new(root.join(ProjectPath::ProjectDir.as_str()));
        store.validate()?;
        let config = ProjectConfig::load(&store.path(ProjectPath::Config))?;
        let remote = FileSpreadsheet::open(config.remote_path(&root)).map_err(|_| {
            Error::config(format!(
                "Remote spreadsheet {} does not exist",
                config.remote_path(&root)
            ))
        })?;
        Self::open(root, Box::new(remote), access)
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn remote(&self) -> &dyn Spreadsheet {
        self.remote.as_ref()
    }

    /// Directory of cached remote snapshots.
    pub fn cache_dir(&self) -> NormalizedPath {
        self.store.path(ProjectPath::CacheDir)
    }

    /// Cached snapshot of the sheet titled `title`.
    pub fn cache_path(&self, title: &str) -> NormalizedPath {
        self.cache_dir().join(&cache_file_name(title))
    }

    /// Stems of every cached snapshot, which are normalized titles.
    pub fn cached_stems(&self) -> Result<BTreeSet<String>> {
        let cache_dir = self.cache_dir();
        let mut stems = BTreeSet::new();
        if !cache_dir.is_dir() {
            return Ok(stems);
        }
        for entry in std::fs::read_dir(cache_dir.to_native())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tsv") && entry.path().is_file() {
                stems.insert(cache_stem(&name).to_string());
            }
        }
        Ok(stems)
    }

    /// Cached snapshot with the given stem.
    pub fn cache_path_for_stem(&self, stem: &str) -> NormalizedPath {
        self.cache_dir().join(&format!("{}.tsv", stem))
    }

    /// Resolve a manifest path against the project root.
    pub fn resolve(&self, path: &str) -> NormalizedPath {
        if Path::new(path).is_absolute() {
            NormalizedPath::new(path)
        } else {
            self.root.join(path)
        }
    }

    /// Local file of a tracked sheet.
    pub fn local_path(&self, record: &SheetRecord) -> NormalizedPath {
        self.resolve(&record.path)
    }

    /// Express a user-supplied path (absolute, or relative to the working
    /// directory) the way the manifest stores it: relative to the project
    /// root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for paths outside the project.
    pub fn manifest_path(&self, path: &Path) -> Result<String> {
        let absolute = absolute_path(path);
        let root = absolute_path(&self.root.to_native());
        absolute
            .strip_prefix(&root)
            .map(|rel| NormalizedPath::new(rel).as_str().to_string())
            .map_err(|_| {
                Error::invalid_input(format!(
                    "{} is outside the project at {}",
                    path.display(),
                    self.root
                ))
            })
    }
}

/// Absolute form of `path`, with symlinks resolved through its closest
/// existing ancestor.
fn absolute_path(path: &Path) -> std::path::PathBuf {
    if let Ok(resolved) = dunce::canonicalize(path) {
        return resolved;
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    for ancestor in joined.ancestors().skip(1) {
        if let Ok(resolved) = dunce::canonicalize(ancestor)
            && let Ok(rest) = joined.strip_prefix(ancestor)
        {
            return resolved.join(rest);
        }
    }
    joined
}

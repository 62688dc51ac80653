//! Command implementations for sheetsync-cli
//!
//! Every `run_*` function takes the directory the command was started in;
//! user-supplied paths are resolved against it.

pub mod init;
pub mod status;
pub mod sync;
pub mod tables;
pub mod tracking;

use std::path::{Path, PathBuf};

use sheetsync_core::{Access, ProjectContext};

use crate::error::Result;

pub use init::{run_delete, run_init};
pub use status::{run_diff, run_status};
pub use sync::{run_fetch, run_pull, run_push};
pub use tables::{run_apply, run_clear};
pub use tracking::{run_add, run_ignore, run_ls, run_mv, run_rm};

/// Open the project enclosing `path` against its file-backed remote.
fn open_project(path: &Path, access: Access) -> Result<ProjectContext> {
    let root = ProjectContext::discover(path)?;
    Ok(ProjectContext::open_with_file_remote(root, access)?)
}

fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    cwd.join(path)
}

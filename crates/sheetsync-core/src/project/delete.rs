//! Delete the spreadsheet and the project directory

use std::fs;

use crate::Result;
use crate::config::ProjectConfig;
use crate::context::ProjectContext;

/// Delete the project's spreadsheet, then remove `.sheetsync/`.
///
/// Takes the context by value: the lock is released before the directory
/// goes away. Tracked tables in the working tree are left alone.
///
/// # Errors
///
/// Returns the remote error when the spreadsheet cannot be deleted; the
/// project directory is untouched in that case.
pub fn delete(ctx: ProjectContext) -> Result<ProjectConfig> {
    let config = ctx.config().clone();
    let project_dir = ctx.store().dir().clone();

    ctx.remote().delete_spreadsheet()?;
    drop(ctx);

    fs::remove_dir_all(project_dir.to_native())?;
    tracing::info!(title = %config.title, id = %config.spreadsheet_id, "Deleted project");
    Ok(config)
}

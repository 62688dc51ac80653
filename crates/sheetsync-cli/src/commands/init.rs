//! Init and delete command implementations

use std::fs;
use std::path::Path;

use colored::Colorize;
use dialoguer::Confirm;
use sheetsync_core::config::DEFAULT_REMOTE;
use sheetsync_core::project::{self, InitOptions};
use sheetsync_core::{Access, FileSpreadsheet, MemorySpreadsheet};
use sheetsync_fs::{NormalizedPath, ProjectPath};

use super::open_project;
use crate::error::Result;

/// Where the spreadsheet document lives for a `--remote` value.
fn remote_location(root: &NormalizedPath, remote: Option<&str>) -> NormalizedPath {
    let remote = remote.unwrap_or(DEFAULT_REMOTE);
    if Path::new(remote).is_absolute() {
        NormalizedPath::new(remote)
    } else {
        root.join(remote)
    }
}

/// Run the init command
///
/// Syncs with the document at `--remote` when it exists; otherwise a new
/// spreadsheet document is created there once the project is set up.
pub fn run_init(path: &Path, title: &str, remote: Option<String>) -> Result<()> {
    let root = NormalizedPath::new(path).absolute();
    let location = remote_location(&root, remote.as_deref());
    let options = InitOptions {
        title: title.to_string(),
        remote,
    };

    let config = if location.is_file() {
        let existing = FileSpreadsheet::open(location.clone())?;
        project::init(&root, &existing, &options)?
    } else {
        let fresh = MemorySpreadsheet::new(title.trim());
        let config = project::init(&root, &fresh, &options)?;
        if let Err(e) = FileSpreadsheet::create_from(location.clone(), &fresh.document()) {
            let _ = fs::remove_dir_all(root.join(ProjectPath::ProjectDir.as_str()).to_native());
            return Err(e.into());
        }
        config
    };

    println!(
        "{} Initialized {} in {}",
        "OK".green().bold(),
        config.title.cyan(),
        root.as_str().yellow()
    );
    println!("{}:   {}", "Spreadsheet".dimmed(), config.spreadsheet_id);
    println!("{}:   {}", "Remote".dimmed(), location);
    println!();
    println!("Track a table with {}.", "sheetsync add PATH".cyan());
    Ok(())
}

/// Run the delete command
///
/// Asks before deleting unless `yes` is set. Local tables stay in place.
pub fn run_delete(cwd: &Path, yes: bool) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete spreadsheet '{}' and remove {}?",
                ctx.config().title,
                ProjectPath::ProjectDir.as_str()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Nothing deleted".dimmed());
            return Ok(());
        }
    }

    let root = ctx.root().clone();
    let config = project::delete(ctx)?;
    println!(
        "{} Deleted {} and its project files in {}",
        "OK".green().bold(),
        config.title.cyan(),
        root.as_str().yellow()
    );
    Ok(())
}

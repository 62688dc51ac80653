//! Tracking commands: add, rm, mv, ignore, ls

use std::path::{Path, PathBuf};

use colored::Colorize;
use dialoguer::Confirm;
use sheetsync_core::Access;
use sheetsync_core::project::{self, AddOptions};

use super::{open_project, resolve};
use crate::error::{CliError, Result};

/// Run the add command
pub fn run_add(
    cwd: &Path,
    path: &Path,
    title: Option<String>,
    description: Option<String>,
    freeze_row: u32,
    freeze_column: u32,
) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    let options = AddOptions {
        title,
        description,
        frozen_rows: freeze_row,
        frozen_cols: freeze_column,
    };
    let record = project::add(&ctx, &resolve(cwd, path), &options)?;
    println!(
        "{} Tracking {} as {}",
        "+".green(),
        record.path.yellow(),
        record.title.cyan()
    );
    Ok(())
}

/// Run the rm command
pub fn run_rm(cwd: &Path, paths: &[PathBuf]) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    let paths: Vec<PathBuf> = paths.iter().map(|p| resolve(cwd, p)).collect();
    for title in project::rm(&ctx, &paths)? {
        println!("{} Removed {} from project", "-".red(), title.cyan());
    }
    Ok(())
}

/// Run the mv command
///
/// Asks before overwriting an existing file unless `yes` is set.
pub fn run_mv(cwd: &Path, path: &Path, new_path: &Path, yes: bool) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    let source = resolve(cwd, path);
    let target = resolve(cwd, new_path);
    if source == target {
        return Err(CliError::user(format!(
            "{} and {} are the same file",
            path.display(),
            new_path.display()
        )));
    }

    let mut overwrite = yes;
    if !overwrite && target.exists() {
        overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite it?", new_path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("{}", "Nothing moved".dimmed());
            return Ok(());
        }
    }

    let outcome = project::mv(&ctx, &source, &target, overwrite)?;
    if outcome.renamed() {
        println!(
            "{} Renamed {} to {} ({})",
            "->".blue(),
            outcome.old_title.cyan(),
            outcome.new_title.cyan(),
            outcome.new_path.yellow()
        );
        println!("The remote tab is renamed on the next {}.", "sheetsync push".cyan());
    } else {
        println!("{} Moved {} to {}", "->".blue(), outcome.old_title.cyan(), outcome.new_path.yellow());
    }
    Ok(())
}

/// Run the ignore command
pub fn run_ignore(cwd: &Path, title: &str, revert: bool) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    if revert {
        let record = project::unignore(&ctx, title)?;
        println!(
            "{} {} is synced again ({})",
            "+".green(),
            record.title.cyan(),
            record.path.yellow()
        );
    } else {
        let record = project::ignore(&ctx, title)?;
        println!("{} {} is now ignored", "-".yellow(), record.title.cyan());
    }
    Ok(())
}

/// Run the ls command
pub fn run_ls(cwd: &Path) -> Result<()> {
    let ctx = open_project(cwd, Access::ReadOnly)?;
    let listing = project::list(&ctx)?;
    if listing.is_empty() {
        println!(
            "{} (use {} to add)",
            "No tracked sheets".dimmed(),
            "sheetsync add".cyan()
        );
        return Ok(());
    }

    let width = listing.iter().map(|s| s.title.chars().count()).max().unwrap_or(0);
    for sheet in &listing {
        let mut line = format!("{:<width$}  {}", sheet.title, sheet.path, width = width);
        if sheet.ignored {
            line = format!("{} {}", line, "(ignored)".dimmed());
        } else if !sheet.present {
            line = format!("{} {}", line, "(not pulled)".yellow());
        }
        println!("{}", line);
    }
    Ok(())
}

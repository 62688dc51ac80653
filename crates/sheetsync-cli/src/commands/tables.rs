//! Attribute commands: apply and clear

use std::path::{Path, PathBuf};

use colored::Colorize;
use sheetsync_core::Access;
use sheetsync_core::project::{self, ClearTarget};

use super::{open_project, resolve};
use crate::error::Result;

/// Run the apply command
pub fn run_apply(cwd: &Path, tables: &[PathBuf]) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    let tables: Vec<PathBuf> = tables.iter().map(|p| resolve(cwd, p)).collect();
    let report = project::apply(&ctx, &tables)?;

    println!(
        "{} Applied {} formatted cells, {} notes, {} validation rules",
        "OK".green().bold(),
        report.formats,
        report.notes,
        report.validations
    );
    for title in &report.skipped {
        println!("  {} skipped untracked sheet {}", "!".yellow(), title.cyan());
    }
    if report.formats + report.notes + report.validations > 0 {
        println!("Run {} to upload them.", "sheetsync push".cyan());
    }
    Ok(())
}

/// Run the clear command
pub fn run_clear(cwd: &Path, keyword: &str, titles: &[String]) -> Result<()> {
    let target: ClearTarget = keyword.parse()?;
    let ctx = open_project(cwd, Access::Exclusive)?;
    let cleared = project::clear(&ctx, target, titles)?;
    if cleared.is_empty() {
        println!("{}", "Nothing to clear".dimmed());
    }
    for title in cleared {
        println!("{} Removed {} from {}", "-".red(), target, title.cyan());
    }
    Ok(())
}

//! Sync commands: fetch, push, pull

use std::path::Path;

use colored::Colorize;
use sheetsync_core::{Access, fetch, pull, push};

use super::open_project;
use crate::error::Result;

fn print_renames(renamed: &[(String, String)]) {
    for (old, new) in renamed {
        println!("  {} {} -> {}", "renamed".blue(), old.cyan(), new.cyan());
    }
}

/// Run the fetch command
pub fn run_fetch(cwd: &Path) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    let report = fetch(&ctx)?;

    println!(
        "{} Fetched {} sheets from {}",
        "OK".green().bold(),
        report.downloaded.len(),
        ctx.config().title.cyan()
    );
    for title in &report.added {
        println!("  {} {}", "new".green(), title.cyan());
    }
    print_renames(&report.renamed);
    for title in &report.removed_remote {
        println!("  {} {}", "deleted remotely".red(), title.cyan());
    }
    println!("Run {} to see what changed.", "sheetsync status".cyan());
    Ok(())
}

/// Run the push command
pub fn run_push(cwd: &Path) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    let report = push(&ctx)?;

    println!(
        "{} Pushed {} sheets to {}",
        "OK".green().bold(),
        report.pushed.len(),
        ctx.config().title.cyan()
    );
    for title in &report.created {
        println!("  {} {}", "created".green(), title.cyan());
    }
    print_renames(&report.renamed);
    for title in &report.deleted {
        println!("  {} {}", "deleted".red(), title.cyan());
    }
    for title in &report.skipped {
        println!("  {} {} (run {} first)", "skipped".yellow(), title.cyan(), "sheetsync pull".cyan());
    }
    for error in &report.attribute_errors {
        println!("  {} {}", "failed".red().bold(), error);
    }
    Ok(())
}

/// Run the pull command
pub fn run_pull(cwd: &Path, force: bool) -> Result<()> {
    let ctx = open_project(cwd, Access::Exclusive)?;
    let report = pull(&ctx, force)?;

    println!(
        "{} Updated {} local tables",
        "OK".green().bold(),
        report.updated.len()
    );
    for title in &report.updated {
        println!("  {} {}", "updated".green(), title.cyan());
    }
    print_renames(&report.renamed);
    if !report.kept_local.is_empty() {
        println!();
        println!("{}", "Kept local changes:".yellow().bold());
        for title in &report.kept_local {
            println!("  {}", title.cyan());
        }
        println!("Run {} to overwrite them.", "sheetsync pull --force".cyan());
    }
    if !report.uncompared.is_empty() {
        println!();
        println!("{}", "Could not compare with the fetched copy:".red().bold());
        for title in &report.uncompared {
            println!("  {}", title.cyan());
        }
        println!("Fix the tables or run {} to overwrite them.", "sheetsync pull --force".cyan());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{run_add, run_init};
    use tempfile::TempDir;

    #[test]
    fn test_push_fetch_pull_cycle() {
        let temp = TempDir::new().unwrap();
        run_init(temp.path(), "Genes", None).unwrap();
        std::fs::write(temp.path().join("genes.tsv"), "id\tname\n1\tTP53\n").unwrap();
        run_add(temp.path(), Path::new("genes.tsv"), None, None, 0, 0).unwrap();

        run_push(temp.path()).unwrap();
        run_fetch(temp.path()).unwrap();
        run_pull(temp.path(), false).unwrap();

        let content = std::fs::read_to_string(temp.path().join("genes.tsv")).unwrap();
        assert_eq!(content, "id\tname\n1\tTP53\n");
    }

    #[test]
    fn test_sync_outside_project_fails() {
        let temp = TempDir::new().unwrap();
        let err = run_fetch(temp.path()).unwrap_err();
        assert!(err.to_string().contains("not inside a sheetsync project"));
    }
}

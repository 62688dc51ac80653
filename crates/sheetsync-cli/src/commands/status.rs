//! Status and diff command implementations

use std::path::Path;

use colored::{ColoredString, Colorize};
use sheetsync_core::{Access, ChangeKind, SheetStatus, StatusReport, diff, status};
use sheetsync_table::LineKind;

use super::open_project;
use crate::error::Result;

const LOCAL_KINDS: [ChangeKind; 4] = [
    ChangeKind::AddedLocal,
    ChangeKind::RemovedLocal,
    ChangeKind::RenamedLocal,
    ChangeKind::ModifiedLocal,
];

const REMOTE_KINDS: [ChangeKind; 4] = [
    ChangeKind::AddedRemote,
    ChangeKind::RemovedRemote,
    ChangeKind::RenamedRemote,
    ChangeKind::ModifiedRemote,
];

fn label(kind: ChangeKind) -> ColoredString {
    let text = format!("{:<16}", kind.as_str());
    match kind {
        ChangeKind::AddedLocal | ChangeKind::AddedRemote => text.green(),
        ChangeKind::RemovedLocal | ChangeKind::RemovedRemote => text.red(),
        ChangeKind::RenamedLocal | ChangeKind::RenamedRemote => text.blue(),
        ChangeKind::ModifiedLocal | ChangeKind::ModifiedRemote => text.yellow(),
        ChangeKind::Unchanged => text.dimmed(),
    }
}

fn print_sheet(sheet: &SheetStatus) {
    let mut line = format!("  {} {}", label(sheet.kind), sheet.title.cyan());
    if let Some(old) = &sheet.renamed_from {
        line = format!("{} (from {})", line, old);
    } else if let Some(path) = &sheet.path {
        line = format!("{} ({})", line, path.dimmed());
    }
    println!("{}", line);
    if let Some(summary) = &sheet.summary {
        for detail in summary.describe() {
            println!("      {}", detail.dimmed());
        }
    }
}

fn print_group(report: &StatusReport, kinds: &[ChangeKind], heading: &str, hint: &str) {
    let sheets: Vec<&SheetStatus> = report
        .sheets
        .iter()
        .filter(|s| kinds.contains(&s.kind))
        .collect();
    if sheets.is_empty() {
        return;
    }
    println!("{} (run {} to apply)", heading.bold(), hint.cyan());
    for sheet in sheets {
        print_sheet(sheet);
    }
    println!();
}

/// Run the status command
pub fn run_status(cwd: &Path, json: bool) -> Result<()> {
    let ctx = open_project(cwd, Access::ReadOnly)?;
    let report = status(&ctx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Project".bold(), ctx.config().title.cyan());
    println!();
    if report.is_clean() {
        println!("{} Local tables and the last fetch agree.", "OK".green().bold());
        return Ok(());
    }
    print_group(&report, &LOCAL_KINDS, "Local changes", "sheetsync push");
    print_group(&report, &REMOTE_KINDS, "Remote changes", "sheetsync pull");
    Ok(())
}

fn paint(kind: LineKind, text: &str) -> ColoredString {
    match kind {
        LineKind::Header => text.bold(),
        LineKind::Separator | LineKind::Omitted | LineKind::Context => text.dimmed(),
        LineKind::Added => text.green(),
        LineKind::Removed => text.red(),
        LineKind::Changed => text.yellow(),
    }
}

/// Run the diff command
pub fn run_diff(cwd: &Path, titles: &[String]) -> Result<()> {
    let ctx = open_project(cwd, Access::ReadOnly)?;
    let diffs = diff(&ctx, titles)?;
    if diffs.is_empty() {
        println!("{} No modified sheets.", "OK".green().bold());
        return Ok(());
    }

    for sheet in diffs {
        let path = sheet.path.as_deref().unwrap_or("");
        println!("{} {} {}", label(sheet.kind), sheet.title.cyan().bold(), path.dimmed());
        for line in &sheet.lines {
            println!("{}", paint(line.kind, &line.text));
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{run_add, run_init};
    use tempfile::TempDir;

    #[test]
    fn test_status_and_diff_on_new_project() {
        let temp = TempDir::new().unwrap();
        run_init(temp.path(), "P", None).unwrap();
        std::fs::write(temp.path().join("genes.tsv"), "id\n1\n").unwrap();
        run_add(temp.path(), Path::new("genes.tsv"), None, None, 0, 0).unwrap();

        assert!(run_status(temp.path(), false).is_ok());
        assert!(run_status(temp.path(), true).is_ok());
        assert!(run_diff(temp.path(), &[]).is_ok());
    }

    #[test]
    fn test_diff_of_untracked_title_fails() {
        let temp = TempDir::new().unwrap();
        run_init(temp.path(), "P", None).unwrap();
        assert!(run_diff(temp.path(), &["nope".to_string()]).is_err());
    }
}

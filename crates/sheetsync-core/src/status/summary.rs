//! Counts of what a table diff changed

use serde::{Deserialize, Serialize};
use sheetsync_table::DiffTag;

/// Added/removed/changed row counts and added/removed column counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added_rows: usize,
    pub removed_rows: usize,
    pub changed_rows: usize,
    pub added_cols: usize,
    pub removed_cols: usize,
}

impl DiffSummary {
    /// Tally the tagged rows of a table diff.
    ///
    /// A leading schema row supplies the column counts; every other row is
    /// counted by its tag.
    pub fn from_diff(rows: &[Vec<String>]) -> Self {
        let mut summary = Self::default();
        for (idx, row) in rows.iter().enumerate() {
            match DiffTag::of_row(row) {
                DiffTag::Schema if idx == 0 => {
                    for cell in &row[1..] {
                        match cell.as_str() {
                            DiffTag::ADDED => summary.added_cols += 1,
                            DiffTag::REMOVED => summary.removed_cols += 1,
                            _ => {}
                        }
                    }
                }
                DiffTag::Added => summary.added_rows += 1,
                DiffTag::Removed => summary.removed_rows += 1,
                DiffTag::Changed => summary.changed_rows += 1,
                _ => {}
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Human-readable lines: additions, removals, changes. Empty parts are
    /// left out.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let added = join_counts(self.added_cols, self.added_rows);
        if !added.is_empty() {
            lines.push(format!("+ {}", added));
        }
        let removed = join_counts(self.removed_cols, self.removed_rows);
        if !removed.is_empty() {
            lines.push(format!("- {}", removed));
        }
        if self.changed_rows > 0 {
            lines.push(format!(
                "-> {} changed {}",
                self.changed_rows,
                plural(self.changed_rows, "line", "lines")
            ));
        }
        lines
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

fn join_counts(cols: usize, rows: usize) -> String {
    let mut parts = Vec::new();
    if cols > 0 {
        parts.push(format!("{} {}", cols, plural(cols, "column", "columns")));
    }
    if rows > 0 {
        parts.push(format!("{} {}", rows, plural(rows, "line", "lines")));
    }
    parts.join(", ")
}

//! Highlighted row-level table diff
//!
//! `TableDiff::compute(old, new)` produces tagged rows in the highlighter
//! layout the rest of sheetsync consumes:
//!
//! ```text
//! !    |       | +++      <- schema row, only when columns were added/removed
//! @@   | id    | name     <- header row
//! ->   | 2     | A->B     <- changed row, differing cells shown as old->new
//! ...  |       |          <- omitted run of unchanged rows
//! +++  | 7     | TP53     <- added row
//! ---  | 9     | MYC      <- removed row
//! ```
//!
//! Identical tables collapse to the header row alone.

use similar::{Algorithm, DiffOp, capture_diff_slices};

/// Tag carried in the first cell of every diff row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    /// Column add/remove markers (`!`)
    Schema,
    /// Column names (`@@`)
    Header,
    /// Row present only in the new table (`+++`)
    Added,
    /// Row present only in the old table (`---`)
    Removed,
    /// Row present in both with differing cells (`->`)
    Changed,
    /// Run of unchanged rows left out (`...`)
    Omitted,
    /// Unchanged row (empty tag)
    Unchanged,
}

impl DiffTag {
    pub const SCHEMA: &'static str = "!";
    pub const HEADER: &'static str = "@@";
    pub const ADDED: &'static str = "+++";
    pub const REMOVED: &'static str = "---";
    pub const CHANGED: &'static str = "->";
    pub const OMITTED: &'static str = "...";

    /// The marker text for this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => Self::SCHEMA,
            Self::Header => Self::HEADER,
            Self::Added => Self::ADDED,
            Self::Removed => Self::REMOVED,
            Self::Changed => Self::CHANGED,
            Self::Omitted => Self::OMITTED,
            Self::Unchanged => "",
        }
    }

    /// Read the tag from the first cell of a diff row.
    pub fn of_row(row: &[String]) -> Self {
        match row.first().map(String::as_str).unwrap_or("") {
            Self::SCHEMA => Self::Schema,
            Self::HEADER => Self::Header,
            Self::ADDED => Self::Added,
            Self::REMOVED => Self::Removed,
            Self::CHANGED => Self::Changed,
            Self::OMITTED => Self::Omitted,
            _ => Self::Unchanged,
        }
    }
}

/// A column of the merged old/new layout
#[derive(Debug, Clone)]
struct Column {
    name: String,
    old_idx: Option<usize>,
    new_idx: Option<usize>,
}

impl Column {
    fn is_common(&self) -> bool {
        self.old_idx.is_some() && self.new_idx.is_some()
    }
}

/// Table diff engine
pub struct TableDiff;

impl TableDiff {
    /// Diff `old` (baseline) against `new` (authoritative).
    ///
    /// Both grids carry their header as the first row. Rows are aligned on
    /// the columns the two tables share, so adding a column does not by
    /// itself mark every row as changed.
    pub fn compute(old: &[Vec<String>], new: &[Vec<String>]) -> Vec<Vec<String>> {
        if old.is_empty() && new.is_empty() {
            return Vec::new();
        }

        let columns = merge_columns(
            old.first().map(Vec::as_slice).unwrap_or(&[]),
            new.first().map(Vec::as_slice).unwrap_or(&[]),
        );

        let mut out = Vec::new();
        if columns.iter().any(|c| !c.is_common()) {
            let mut schema = vec![DiffTag::SCHEMA.to_string()];
            schema.extend(columns.iter().map(|c| match (c.old_idx, c.new_idx) {
                (None, Some(_)) => DiffTag::ADDED.to_string(),
                (Some(_), None) => DiffTag::REMOVED.to_string(),
                _ => String::new(),
            }));
            out.push(schema);
        }

        let mut header = vec![DiffTag::HEADER.to_string()];
        header.extend(columns.iter().map(|c| c.name.clone()));
        out.push(header);

        let old_body = old.get(1..).unwrap_or(&[]);
        let new_body = new.get(1..).unwrap_or(&[]);
        let old_keys: Vec<Vec<&str>> = old_body
            .iter()
            .map(|row| common_key(row, &columns, |c| c.old_idx))
            .collect();
        let new_keys: Vec<Vec<&str>> = new_body
            .iter()
            .map(|row| common_key(row, &columns, |c| c.new_idx))
            .collect();

        let blank = vec![String::new(); columns.len()];
        let mut body = Vec::new();
        for op in capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys) {
            match op {
                DiffOp::Equal { .. } => {
                    let mut row = vec![DiffTag::OMITTED.to_string()];
                    row.extend(blank.iter().cloned());
                    body.push(row);
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    for row in &old_body[old_index..old_index + old_len] {
                        body.push(tagged(DiffTag::Removed, project(row, &columns, |c| c.old_idx)));
                    }
                }
                DiffOp::Insert {
                    new_index, new_len, ..
                } => {
                    for row in &new_body[new_index..new_index + new_len] {
                        body.push(tagged(DiffTag::Added, project(row, &columns, |c| c.new_idx)));
                    }
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    let paired = old_len.min(new_len);
                    for k in 0..paired {
                        let before = project(&old_body[old_index + k], &columns, |c| c.old_idx);
                        let after = project(&new_body[new_index + k], &columns, |c| c.new_idx);
                        body.push(tagged(DiffTag::Changed, changed_cells(before, after)));
                    }
                    for row in &old_body[old_index + paired..old_index + old_len] {
                        body.push(tagged(DiffTag::Removed, project(row, &columns, |c| c.old_idx)));
                    }
                    for row in &new_body[new_index + paired..new_index + new_len] {
                        body.push(tagged(DiffTag::Added, project(row, &columns, |c| c.new_idx)));
                    }
                }
            }
        }

        // Leading and trailing omission markers carry no information
        while body
            .first()
            .is_some_and(|r| DiffTag::of_row(r) == DiffTag::Omitted)
        {
            body.remove(0);
        }
        while body
            .last()
            .is_some_and(|r| DiffTag::of_row(r) == DiffTag::Omitted)
        {
            body.pop();
        }

        out.extend(body);
        out
    }
}

/// Old columns in order, matched to new columns by name, then columns only
/// the new table has.
fn merge_columns(old_header: &[String], new_header: &[String]) -> Vec<Column> {
    let mut used = vec![false; new_header.len()];
    let mut columns = Vec::with_capacity(old_header.len().max(new_header.len()));

    for (old_idx, name) in old_header.iter().enumerate() {
        let new_idx = new_header
            .iter()
            .enumerate()
            .position(|(i, n)| !used[i] && n == name);
        if let Some(i) = new_idx {
            used[i] = true;
        }
        columns.push(Column {
            name: name.clone(),
            old_idx: Some(old_idx),
            new_idx,
        });
    }
    for (new_idx, name) in new_header.iter().enumerate() {
        if !used[new_idx] {
            columns.push(Column {
                name: name.clone(),
                old_idx: None,
                new_idx: Some(new_idx),
            });
        }
    }
    columns
}

fn common_key<'a>(
    row: &'a [String],
    columns: &[Column],
    side: impl Fn(&Column) -> Option<usize>,
) -> Vec<&'a str> {
    columns
        .iter()
        .filter(|c| c.is_common())
        .map(|c| side(c).and_then(|i| row.get(i)).map_or("", String::as_str))
        .collect()
}

fn project(row: &[String], columns: &[Column], side: impl Fn(&Column) -> Option<usize>) -> Vec<String> {
    columns
        .iter()
        .map(|c| side(c).and_then(|i| row.get(i)).cloned().unwrap_or_default())
        .collect()
}

fn changed_cells(before: Vec<String>, after: Vec<String>) -> Vec<String> {
    before
        .into_iter()
        .zip(after)
        .map(|(b, a)| if b == a { a } else { format!("{}->{}", b, a) })
        .collect()
}

fn tagged(tag: DiffTag, cells: Vec<String>) -> Vec<String> {
    let mut row = Vec::with_capacity(cells.len() + 1);
    row.push(tag.as_str().to_string());
    row.extend(cells);
    row
}

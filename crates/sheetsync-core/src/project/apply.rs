//! Apply message and data-validation tables to tracked sheets
//!
//! A message table (`table, cell, level, rule id, rule, message,
//! suggestion`) turns each row into an applied format and a note on one
//! cell. A data-validation table (`table, range, condition, value`) adds
//! validation rules. The kind of table is decided by its header row.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;
use sheetsync_fs::NormalizedPath;
use sheetsync_table::{CellAddress, grid};

use crate::aggregate::aggregate_runs;
use crate::context::ProjectContext;
use crate::manifest::formats::{ERROR_FORMAT, INFO_FORMAT, LAST_APPLIED_FORMAT, WARN_FORMAT};
use crate::manifest::{FormatRow, NoteRow, SaveMode, ValidationRow};
use crate::naming::title_from_path;
use crate::validation::check_rule;
use crate::{Error, Result};

const VALIDATION_HEADERS: [&str; 4] = ["table", "range", "condition", "value"];
const MESSAGE_HEADERS: [&str; 7] = [
    "table",
    "cell",
    "level",
    "rule id",
    "rule",
    "message",
    "suggestion",
];

/// Severity of an applied message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    Error,
    Warn,
    Info,
}

impl Level {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    fn format_id(self) -> u32 {
        match self {
            Self::Error => ERROR_FORMAT,
            Self::Warn => WARN_FORMAT,
            Self::Info => INFO_FORMAT,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
        }
    }
}

/// Whether a note was written by a previous apply.
fn is_applied_note(note: &str) -> bool {
    [Level::Error, Level::Warn, Level::Info].iter().any(|level| {
        note.strip_prefix(level.label())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(": ") || rest.starts_with('\n'))
    })
}

/// One parsed message row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Message {
    sheet: String,
    cell: CellAddress,
    level: Level,
    rule_id: String,
    rule: String,
    message: String,
    suggestion: String,
}

impl Message {
    /// Note text: `LEVEL: rule`, then the message, suggestion and rule id on
    /// their own lines when present.
    fn note(&self) -> String {
        let mut note = if self.rule.is_empty() {
            self.level.label().to_string()
        } else {
            format!("{}: {}", self.level.label(), self.rule)
        };
        if !self.message.is_empty() {
            note.push('\n');
            note.push_str(&self.message);
        }
        if !self.suggestion.is_empty() {
            note.push_str(&format!("\nSuggested Fix: \"{}\"", self.suggestion));
        }
        if !self.rule_id.is_empty() {
            note.push_str(&format!("\nFor more details, see {}", self.rule_id));
        }
        note
    }
}

/// What an apply wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Applied-format cells
    pub formats: usize,
    /// Applied notes
    pub notes: usize,
    /// Validation rules added
    pub validations: usize,
    /// Message rows naming an untracked sheet
    pub skipped: Vec<String>,
}

enum Table {
    Messages(Vec<HashMap<String, String>>),
    Validation(Vec<HashMap<String, String>>),
}

fn read_table(path: &Path) -> Result<Table> {
    let path = NormalizedPath::new(path);
    let rows = grid::read_grid(&path)?;
    let mut rows = rows.into_iter();
    let headers: Vec<String> = rows
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let records: Vec<HashMap<String, String>> = rows
        .map(|row| headers.iter().cloned().zip(row).collect())
        .collect();

    if headers == VALIDATION_HEADERS {
        return Ok(Table::Validation(records));
    }
    let is_messages = headers.iter().any(|h| h == "table")
        && headers.iter().any(|h| h == "cell")
        && headers.iter().all(|h| MESSAGE_HEADERS.contains(&h.as_str()));
    if is_messages {
        return Ok(Table::Messages(records));
    }
    Err(Error::invalid_input(format!(
        "The headers in table {} are not valid for apply",
        path
    )))
}

fn field<'a>(row: &'a HashMap<String, String>, name: &str) -> &'a str {
    row.get(name).map(|v| v.trim()).unwrap_or_default()
}

/// Apply every table in `paths`.
///
/// All tables are read and every row is checked before anything is
/// written, so one bad row rejects the whole batch.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for unrecognized headers, malformed
/// cells or ranges, unknown levels or condition types, wrong value counts,
/// and validation rules for untracked sheets.
pub fn apply<P: AsRef<Path>>(ctx: &ProjectContext, paths: &[P]) -> Result<ApplyReport> {
    let store = ctx.store();
    let sheets = store.sheets()?;
    let tracked = |title: &str| sheets.iter().any(|s| s.title == title && !s.ignored);

    let mut report = ApplyReport::default();
    let mut messages: Vec<Message> = Vec::new();
    let mut rules: BTreeMap<String, Vec<ValidationRow>> = BTreeMap::new();

    for path in paths {
        match read_table(path.as_ref())? {
            Table::Validation(rows) => {
                for row in rows {
                    let sheet = field(&row, "table");
                    if !tracked(sheet) {
                        return Err(Error::invalid_input(format!("'{}' is not a tracked sheet", sheet)));
                    }
                    let (range, rule) = check_rule(field(&row, "range"), field(&row, "condition"), field(&row, "value"))?;
                    rules
                        .entry(sheet.to_string())
                        .or_default()
                        .push(ValidationRow::new(sheet, range, rule.condition, &rule.values));
                }
            }
            Table::Messages(rows) => {
                for row in rows {
                    let cell = field(&row, "cell");
                    if cell.is_empty() {
                        continue;
                    }
                    let table = field(&row, "table");
                    let sheet = sheets
                        .iter()
                        .find(|s| s.title == table || (!s.path.is_empty() && s.path == table))
                        .map(|s| s.title.clone())
                        .or_else(|| title_from_path(table))
                        .unwrap_or_else(|| table.to_string());
                    if !tracked(&sheet) {
                        tracing::warn!("'{}' is not a tracked sheet", sheet);
                        report.skipped.push(sheet);
                        continue;
                    }
                    let cell = CellAddress::parse(&cell.to_ascii_uppercase())
                        .map_err(|_| Error::invalid_input(format!("'{}' is not a valid cell", cell)))?;
                    let level = Level::parse(field(&row, "level")).ok_or_else(|| {
                        Error::invalid_input(format!("'{}' is not a valid level", field(&row, "level")))
                    })?;
                    messages.push(Message {
                        sheet,
                        cell,
                        level,
                        rule_id: field(&row, "rule id").to_string(),
                        rule: field(&row, "rule").to_string(),
                        message: field(&row, "message").to_string(),
                        suggestion: field(&row, "suggestion").to_string(),
                    });
                }
            }
        }
    }

    if !messages.is_empty() {
        apply_messages(ctx, &messages, &mut report)?;
    }
    if !rules.is_empty() {
        report.validations = rules.values().map(Vec::len).sum();
        store.save_attributes(&rules, &[], SaveMode::Append)?;
    }
    tracing::info!(
        formats = report.formats,
        notes = report.notes,
        validations = report.validations,
        "Applied tables"
    );
    Ok(report)
}

/// Replace every previously applied format and note with those of
/// `messages`. When several messages hit one cell, the most severe level
/// sets the format and the notes are concatenated.
fn apply_messages(ctx: &ProjectContext, messages: &[Message], report: &mut ApplyReport) -> Result<()> {
    let store = ctx.store();

    let mut applied_formats: BTreeMap<String, BTreeMap<CellAddress, Level>> = BTreeMap::new();
    let mut applied_notes: BTreeMap<String, BTreeMap<CellAddress, String>> = BTreeMap::new();
    for message in messages {
        applied_formats
            .entry(message.sheet.clone())
            .or_default()
            .entry(message.cell)
            .and_modify(|level| *level = (*level).min(message.level))
            .or_insert(message.level);
        tracing::debug!("Adding {} to {} as {}", message.rule, message.cell, message.level.label());
        applied_notes
            .entry(message.sheet.clone())
            .or_default()
            .entry(message.cell)
            .and_modify(|note| {
                note.push_str("\n\n");
                note.push_str(&message.note());
            })
            .or_insert_with(|| message.note());
    }

    let mut formats: Vec<FormatRow> = store
        .attributes::<FormatRow>()?
        .into_iter()
        .filter(|row| row.format_id > LAST_APPLIED_FORMAT)
        .collect();
    for (sheet, cells) in &applied_formats {
        let runs = aggregate_runs(cells.iter().map(|(cell, level)| (*cell, Some(level.format_id()))));
        for (cell, format_id) in runs {
            formats.push(FormatRow {
                sheet_title: sheet.clone(),
                cell,
                format_id,
            });
        }
        report.formats += cells.len();
    }

    let mut notes: Vec<NoteRow> = store
        .attributes::<NoteRow>()?
        .into_iter()
        .filter(|row| !is_applied_note(&row.note))
        .filter(|row| {
            !applied_notes
                .get(&row.sheet_title)
                .is_some_and(|cells| cells.contains_key(&row.cell))
        })
        .collect();
    for (sheet, cells) in applied_notes {
        for (cell, note) in cells {
            notes.push(NoteRow {
                sheet_title: sheet.clone(),
                cell,
                note,
            });
            report.notes += 1;
        }
    }

    store.replace_attributes(&formats)?;
    store.replace_attributes(&notes)?;
    Ok(())
}

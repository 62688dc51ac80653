//! Reconciliation engine
//!
//! Classifies every known sheet by comparing three surfaces: the manifest,
//! the cached remote snapshots and the local files. Presence alone settles
//! most cases (see [`classify_presence`]); sheets present on both sides are
//! compared by content.
//!
//! Which side is newer is decided by file modification time. That is a
//! heuristic: it cannot see clock skew, and an editor that preserves mtimes
//! on save makes a local edit look stale. Identical contents are detected by
//! checksum first so untouched sheets are never misreported.

mod summary;

pub use summary::DiffSummary;

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sheetsync_fs::{NormalizedPath, checksum};
use sheetsync_table::{DiffTag, RenderedLine, TableDiff, grid, render_diff};

use crate::context::ProjectContext;
use crate::manifest::{Manifest, Origin, RenameRecord, SheetRecord};
use crate::naming::normalize_title;
use crate::{Error, Result};

/// Per-sheet verdict of the reconciliation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Unchanged,
    AddedLocal,
    AddedRemote,
    RemovedLocal,
    RemovedRemote,
    RenamedLocal,
    RenamedRemote,
    ModifiedLocal,
    ModifiedRemote,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::AddedLocal => "added-local",
            Self::AddedRemote => "added-remote",
            Self::RemovedLocal => "removed-local",
            Self::RemovedRemote => "removed-remote",
            Self::RenamedLocal => "renamed-local",
            Self::RenamedRemote => "renamed-remote",
            Self::ModifiedLocal => "modified-local",
            Self::ModifiedRemote => "modified-remote",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetStatus {
    pub title: String,
    pub kind: ChangeKind,
    /// Local path from the manifest, when the sheet is tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DiffSummary>,
    /// Previous title, for renames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
}

impl SheetStatus {
    fn new(title: &str, kind: ChangeKind, record: Option<&SheetRecord>) -> Self {
        Self {
            title: title.to_string(),
            kind,
            path: record.map(|r| r.path.clone()).filter(|p| !p.is_empty()),
            summary: None,
            renamed_from: None,
        }
    }
}

/// Every classified sheet, ordered by title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub sheets: Vec<SheetStatus>,
}

impl StatusReport {
    pub fn get(&self, title: &str) -> Option<&SheetStatus> {
        self.sheets
            .iter()
            .find(|s| s.title == title && !matches!(s.kind, ChangeKind::RenamedLocal | ChangeKind::RenamedRemote))
    }

    pub fn kind_of(&self, title: &str) -> Option<ChangeKind> {
        self.get(title).map(|s| s.kind)
    }

    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &SheetStatus> {
        self.sheets.iter().filter(move |s| s.kind == kind)
    }

    /// Sheets that are not unchanged.
    pub fn changes(&self) -> impl Iterator<Item = &SheetStatus> {
        self.sheets.iter().filter(|s| s.kind != ChangeKind::Unchanged)
    }

    pub fn is_clean(&self) -> bool {
        self.changes().next().is_none()
    }
}

/// What is known about one title before comparing contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetFacts {
    /// Listed in the manifest (and not ignored)
    pub tracked: bool,
    /// A cached remote snapshot exists
    pub cached: bool,
    /// The file at the manifest path exists
    pub local: bool,
    /// The manifest record has a remote id
    pub pushed: bool,
    /// Old or new title of any pending rename
    pub renamed: bool,
    /// New title of a pending remote rename
    pub remote_rename_target: bool,
}

/// Classify a sheet from presence alone.
///
/// Returns `None` when the sheet exists on both sides and must be compared
/// by content.
pub fn classify_presence(facts: &SheetFacts) -> Option<ChangeKind> {
    let SheetFacts {
        tracked,
        cached,
        local,
        pushed,
        renamed,
        remote_rename_target,
    } = *facts;

    if tracked && local && pushed && !cached {
        Some(ChangeKind::RemovedRemote)
    } else if tracked && local && !pushed && !cached {
        Some(ChangeKind::AddedLocal)
    } else if !tracked && !local && cached && !renamed {
        Some(ChangeKind::RemovedLocal)
    } else if tracked && !local && cached && !remote_rename_target {
        Some(ChangeKind::AddedRemote)
    } else {
        None
    }
}

/// Outcome of comparing a local table with its cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// `Unchanged`, `ModifiedLocal` or `ModifiedRemote`
    pub kind: ChangeKind,
    /// Tagged diff rows from baseline to the newer side
    pub diff: Vec<Vec<String>>,
}

/// Compare a local table with its cached snapshot.
///
/// Rows are padded to the header width on both sides before comparing, so
/// trailing empty cells dropped by the remote do not count as changes. The
/// more recently modified file is treated as authoritative; ties go to the
/// local side.
pub fn compare_tables(local: &NormalizedPath, cached: &NormalizedPath) -> Result<Comparison> {
    let mut local_grid = grid::read_grid(local)?;
    let mut cached_grid = grid::read_grid(cached)?;
    grid::pad_to_header(&mut local_grid);
    grid::pad_to_header(&mut cached_grid);

    let local_sum = checksum::compute_content_checksum(&grid::format_grid(&local_grid, b'\t')?);
    let cached_sum = checksum::compute_content_checksum(&grid::format_grid(&cached_grid, b'\t')?);
    if local_sum == cached_sum {
        return Ok(Comparison {
            kind: ChangeKind::Unchanged,
            diff: TableDiff::compute(&cached_grid, &local_grid),
        });
    }

    let remote_newer = match (local.modified(), cached.modified()) {
        (Some(local_time), Some(cached_time)) => cached_time > local_time,
        _ => false,
    };
    let (kind, diff) = if remote_newer {
        (ChangeKind::ModifiedRemote, TableDiff::compute(&local_grid, &cached_grid))
    } else {
        (ChangeKind::ModifiedLocal, TableDiff::compute(&cached_grid, &local_grid))
    };

    let has_changes = diff
        .iter()
        .any(|row| !matches!(DiffTag::of_row(row), DiffTag::Header | DiffTag::Omitted | DiffTag::Unchanged));
    Ok(Comparison {
        kind: if has_changes { kind } else { ChangeKind::Unchanged },
        diff,
    })
}

/// Classifies the sheets of one project.
struct Classifier<'a> {
    ctx: &'a ProjectContext,
    manifest: &'a Manifest,
}

impl<'a> Classifier<'a> {
    fn record(&self, title: &str) -> Option<&'a SheetRecord> {
        self.manifest.active_sheets().find(|s| s.title == title)
    }

    fn rename_from(&self, old_title: &str) -> Option<&'a RenameRecord> {
        self.manifest.renames.iter().find(|r| r.old_title == old_title)
    }

    /// Titles to classify: active manifest titles plus cached snapshots that
    /// belong to no known title.
    fn titles(&self) -> Result<BTreeSet<String>> {
        let mut titles: BTreeSet<String> =
            self.manifest.active_sheets().map(|s| s.title.clone()).collect();

        let known: HashSet<String> = self
            .manifest
            .sheets
            .iter()
            .map(|s| s.title.as_str())
            .chain(self.manifest.renames.iter().flat_map(|r| [r.old_title.as_str(), r.new_title.as_str()]))
            .map(normalize_title)
            .collect();
        for stem in self.ctx.cached_stems()? {
            if !known.contains(&stem) {
                titles.insert(stem);
            }
        }
        Ok(titles)
    }

    fn facts(&self, title: &str) -> SheetFacts {
        let record = self.record(title);
        SheetFacts {
            tracked: record.is_some(),
            cached: self.ctx.cache_path(title).is_file(),
            local: record.is_some_and(|r| !r.path.is_empty() && self.ctx.local_path(r).is_file()),
            pushed: record.is_some_and(SheetRecord::is_pushed),
            renamed: self
                .manifest
                .renames
                .iter()
                .any(|r| r.old_title == title || r.new_title == title),
            remote_rename_target: self
                .manifest
                .renames
                .iter()
                .any(|r| r.origin == Origin::Remote && r.new_title == title),
        }
    }

    /// Compare contents of `title`, resolving a pending rename to its new
    /// title. Returns the resolved title with the comparison.
    fn compare(&self, title: &str) -> Result<(String, Option<&'a SheetRecord>, Comparison)> {
        let resolved = self
            .rename_from(title)
            .map_or(title, |r| r.new_title.as_str())
            .to_string();
        let record = self.record(&resolved).or_else(|| self.record(title));
        let Some(local_record) = record.filter(|r| !r.path.is_empty()) else {
            return Err(Error::NotFound(format!("local path for sheet '{}'", resolved)));
        };
        let local = self.ctx.local_path(local_record);
        let cached = self.ctx.cache_path(&resolved);
        let comparison = compare_tables(&local, &cached)?;
        Ok((resolved, record, comparison))
    }

    fn classify(&self) -> Result<StatusReport> {
        let mut sheets = Vec::new();
        let mut compared: HashSet<String> = HashSet::new();

        for title in self.titles()? {
            let facts = self.facts(&title);
            if let Some(kind) = classify_presence(&facts) {
                sheets.push(SheetStatus::new(&title, kind, self.record(&title)));
                continue;
            }
            match self.compare(&title) {
                Ok((resolved, record, comparison)) => {
                    if !compared.insert(resolved.clone()) {
                        continue;
                    }
                    let mut status = SheetStatus::new(&resolved, comparison.kind, record);
                    if comparison.kind != ChangeKind::Unchanged {
                        status.summary = Some(DiffSummary::from_diff(&comparison.diff));
                    }
                    sheets.push(status);
                }
                Err(e) => {
                    tracing::warn!("Unable to compare sheet '{}': {}", title, e);
                }
            }
        }

        for rename in &self.manifest.renames {
            let kind = match rename.origin {
                Origin::Local => ChangeKind::RenamedLocal,
                Origin::Remote => ChangeKind::RenamedRemote,
            };
            sheets.push(SheetStatus {
                title: rename.new_title.clone(),
                kind,
                path: Some(rename.new_path.clone()).filter(|p| !p.is_empty()),
                summary: None,
                renamed_from: Some(rename.old_title.clone()),
            });
        }

        sheets.sort_by(|a, b| a.title.cmp(&b.title).then(a.kind.cmp(&b.kind)));
        Ok(StatusReport { sheets })
    }
}

/// Classify every sheet of the project. Read-only.
///
/// # Errors
///
/// Only manifest and cache-directory failures are errors; a sheet that
/// cannot be compared is logged and left out of the report.
pub fn status(ctx: &ProjectContext) -> Result<StatusReport> {
    let manifest = ctx.store().load()?;
    Classifier {
        ctx,
        manifest: &manifest,
    }
    .classify()
}

/// Table diff of one modified sheet, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDiff {
    pub title: String,
    pub kind: ChangeKind,
    pub path: Option<String>,
    pub rows: Vec<Vec<String>>,
    pub lines: Vec<RenderedLine>,
}

/// Diffs of the modified sheets among `titles` (all sheets when empty).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when a requested title is not tracked.
pub fn diff(ctx: &ProjectContext, titles: &[String]) -> Result<Vec<SheetDiff>> {
    let manifest = ctx.store().load()?;
    let classifier = Classifier {
        ctx,
        manifest: &manifest,
    };
    for title in titles {
        if classifier.record(title).is_none() {
            return Err(Error::invalid_input(format!("'{}' is not a tracked sheet", title)));
        }
    }

    let mut diffs = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for title in classifier.titles()? {
        if classify_presence(&classifier.facts(&title)).is_some() {
            continue;
        }
        let (resolved, record, comparison) = match classifier.compare(&title) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Unable to compare sheet '{}': {}", title, e);
                continue;
            }
        };
        let wanted = titles.is_empty() || titles.contains(&title) || titles.contains(&resolved);
        if !wanted || comparison.kind == ChangeKind::Unchanged || !seen.insert(resolved.clone()) {
            continue;
        }
        diffs.push(SheetDiff {
            title: resolved,
            kind: comparison.kind,
            path: record.map(|r| r.path.clone()),
            lines: render_diff(&comparison.diff),
            rows: comparison.diff,
        });
    }
    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn facts(tracked: bool, cached: bool, local: bool, pushed: bool) -> SheetFacts {
        SheetFacts {
            tracked,
            cached,
            local,
            pushed,
            ..SheetFacts::default()
        }
    }

    #[rstest]
    #[case(facts(true, false, true, true), Some(ChangeKind::RemovedRemote))]
    #[case(facts(true, false, true, false), Some(ChangeKind::AddedLocal))]
    #[case(facts(false, true, false, false), Some(ChangeKind::RemovedLocal))]
    #[case(facts(true, true, false, true), Some(ChangeKind::AddedRemote))]
    #[case(facts(true, true, true, true), None)]
    #[case(facts(true, false, false, true), None)]
    fn presence_rules(#[case] facts: SheetFacts, #[case] expected: Option<ChangeKind>) {
        assert_eq!(classify_presence(&facts), expected);
    }

    #[test]
    fn renamed_cache_is_not_removed_local() {
        let facts = SheetFacts {
            renamed: true,
            ..facts(false, true, false, false)
        };
        assert_eq!(classify_presence(&facts), None);
    }

    #[test]
    fn remote_rename_target_is_not_added_remote() {
        let facts = SheetFacts {
            renamed: true,
            remote_rename_target: true,
            ..facts(true, true, false, true)
        };
        assert_eq!(classify_presence(&facts), None);
    }

    #[test]
    fn kinds_serialize_kebab_case() {
        let json = serde_json::to_string(&ChangeKind::ModifiedRemote).unwrap();
        assert_eq!(json, "\"modified-remote\"");
        assert_eq!(ChangeKind::AddedLocal.to_string(), "added-local");
    }

    fn write(path: &NormalizedPath, content: &str) {
        std::fs::write(path.to_native(), content).unwrap();
    }

    fn set_mtime(path: &NormalizedPath, secs_ago: u64) {
        let time = std::time::SystemTime::now() - std::time::Duration::from_secs(secs_ago);
        std::fs::File::options()
            .write(true)
            .open(path.to_native())
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn identical_content_is_unchanged_regardless_of_padding() {
        let dir = tempfile::tempdir().unwrap();
        let local = NormalizedPath::new(dir.path().join("genes.csv"));
        let cached = NormalizedPath::new(dir.path().join("genes.tsv"));
        write(&local, "id,name\n1,\n2,TP53\n");
        write(&cached, "id\tname\n1\n2\tTP53\n");

        let comparison = compare_tables(&local, &cached).unwrap();
        assert_eq!(comparison.kind, ChangeKind::Unchanged);
    }

    #[test]
    fn newer_side_is_authoritative() {
        let dir = tempfile::tempdir().unwrap();
        let local = NormalizedPath::new(dir.path().join("local.tsv"));
        let cached = NormalizedPath::new(dir.path().join("cached.tsv"));
        write(&local, "id\tname\n1\tBRCA1\n");
        write(&cached, "id\tname\n1\tTP53\n");

        set_mtime(&local, 100);
        set_mtime(&cached, 10);
        let comparison = compare_tables(&local, &cached).unwrap();
        assert_eq!(comparison.kind, ChangeKind::ModifiedRemote);
        assert_eq!(comparison.diff[1][2], "BRCA1->TP53");

        set_mtime(&local, 1);
        let comparison = compare_tables(&local, &cached).unwrap();
        assert_eq!(comparison.kind, ChangeKind::ModifiedLocal);
        assert_eq!(comparison.diff[1][2], "TP53->BRCA1");
    }

    #[test]
    fn unreadable_side_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let local = NormalizedPath::new(dir.path().join("local.tsv"));
        write(&local, "id\n");
        let missing = NormalizedPath::new(dir.path().join("missing.tsv"));
        assert!(compare_tables(&local, &missing).is_err());
    }
}

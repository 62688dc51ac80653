//! Tracking operations on `sheet.tsv`: add, rm, mv, ignore, ls

use std::path::Path;

use sheetsync_fs::{NormalizedPath, io};

use crate::context::ProjectContext;
use crate::manifest::{Origin, RenameRecord, SheetRecord};
use crate::naming::{new_local_path, normalize_title, title_from_path};
use crate::{Error, Result};

/// Options for [`add`].
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Sheet title; defaults to the file name up to its first dot
    pub title: Option<String>,
    pub description: Option<String>,
    pub frozen_rows: u32,
    pub frozen_cols: u32,
}

/// Manifest paths compare as normalized text.
fn same_path(a: &str, b: &str) -> bool {
    NormalizedPath::new(a) == NormalizedPath::new(b)
}

fn check_table_path(path: &str) -> Result<()> {
    match NormalizedPath::new(path).extension() {
        Some("tsv" | "csv") => Ok(()),
        _ => Err(Error::invalid_input(format!(
            "{} is not a TSV or CSV file",
            path
        ))),
    }
}

/// Start tracking the local table at `path`.
///
/// # Errors
///
/// - [`Error::NotFound`] if the file does not exist
/// - [`Error::InvalidInput`] for a path outside the project or a file that
///   is neither TSV nor CSV
/// - [`Error::Conflict`] if the title or the path is already tracked
pub fn add(ctx: &ProjectContext, path: &Path, options: &AddOptions) -> Result<SheetRecord> {
    if !path.is_file() {
        return Err(Error::NotFound(format!("{}", path.display())));
    }
    let manifest_path = ctx.manifest_path(path)?;
    check_table_path(&manifest_path)?;

    let title = match &options.title {
        Some(title) => title.trim().to_string(),
        None => title_from_path(&manifest_path).unwrap_or_default(),
    };
    if title.is_empty() {
        return Err(Error::invalid_input(format!(
            "Cannot derive a sheet title from {}",
            manifest_path
        )));
    }

    let store = ctx.store();
    let sheets = store.sheets()?;
    if sheets.iter().any(|s| s.title == title) {
        return Err(Error::conflict(format!(
            "'{}' sheet already exists in this project",
            title
        )));
    }
    if let Some(other) = sheets.iter().find(|s| same_path(&s.path, &manifest_path)) {
        return Err(Error::conflict(format!(
            "Local table {} already exists as '{}'",
            manifest_path, other.title
        )));
    }

    let mut record = SheetRecord::new(title, manifest_path);
    record.description = options.description.clone().unwrap_or_default();
    record.frozen_rows = options.frozen_rows;
    record.frozen_cols = options.frozen_cols;
    store.save_sheets(std::slice::from_ref(&record), &[])?;
    crate::sync::refresh_fields(ctx, &store.sheets()?)?;

    tracing::info!("'{}' successfully added to project", record.title);
    Ok(record)
}

/// Stop tracking the sheets at `paths`.
///
/// Their attribute rows are removed. Local files and cached snapshots are
/// kept, so the sheets read as `removed-local` until the next push deletes
/// their tabs. Returns the removed titles.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if any path is not tracked
/// - [`Error::Conflict`] if no non-ignored sheet would remain
///
/// Both are checked before anything is written.
pub fn rm<P: AsRef<Path>>(ctx: &ProjectContext, paths: &[P]) -> Result<Vec<String>> {
    let store = ctx.store();
    let sheets = store.sheets()?;

    let mut removed: Vec<String> = Vec::new();
    let mut untracked: Vec<String> = Vec::new();
    for path in paths {
        let manifest_path = ctx.manifest_path(path.as_ref())?;
        match sheets.iter().find(|s| same_path(&s.path, &manifest_path)) {
            Some(record) if !removed.contains(&record.title) => removed.push(record.title.clone()),
            Some(_) => {}
            None => untracked.push(manifest_path),
        }
    }
    if !untracked.is_empty() {
        return Err(Error::invalid_input(format!(
            "Unable to remove untracked file(s): {}",
            untracked.join(", ")
        )));
    }

    let remaining = sheets
        .iter()
        .filter(|s| !s.ignored && !removed.contains(&s.title))
        .count();
    if remaining == 0 {
        return Err(Error::conflict(format!(
            "Unable to remove {} tracked sheet(s): the spreadsheet must keep at least one sheet",
            removed.len()
        )));
    }

    store.save_sheets(&[], &removed)?;
    store.remove_attributes(&removed)?;
    for title in &removed {
        tracing::info!("Removed '{}' from project; its tab is deleted on the next push", title);
    }
    crate::sync::refresh_fields(ctx, &store.sheets()?)?;
    Ok(removed)
}

/// Result of [`mv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub old_title: String,
    pub new_title: String,
    pub new_path: String,
}

impl MoveOutcome {
    pub fn renamed(&self) -> bool {
        self.old_title != self.new_title
    }
}

/// Move a tracked sheet's local file to `new_path`.
///
/// When the file name (up to its first dot) changes, the sheet takes that
/// as its new title: a local rename is recorded for the next push, the
/// cached snapshot is copied to the new title and the attribute rows are
/// re-keyed.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if `path` is not tracked or `new_path` is not
///   a TSV/CSV path inside the project
/// - [`Error::Conflict`] if another sheet already has the new title, or
///   `new_path` exists and `overwrite` is false
pub fn mv(ctx: &ProjectContext, path: &Path, new_path: &Path, overwrite: bool) -> Result<MoveOutcome> {
    let store = ctx.store();
    let mut sheets = store.sheets()?;

    let old_manifest_path = ctx.manifest_path(path)?;
    let new_manifest_path = ctx.manifest_path(new_path)?;
    check_table_path(&new_manifest_path)?;

    let Some(idx) = sheets
        .iter()
        .position(|s| same_path(&s.path, &old_manifest_path))
    else {
        return Err(Error::invalid_input(format!(
            "{} is not a tracked sheet",
            old_manifest_path
        )));
    };
    let old_title = sheets[idx].title.clone();
    let new_title = title_from_path(&new_manifest_path).unwrap_or_else(|| old_title.clone());

    if new_title != old_title
        && let Some(existing) = sheets.iter().find(|s| s.title == new_title)
    {
        return Err(Error::conflict(format!(
            "Unable to rename '{}' to '{}': a tracked sheet with this title already exists ({})",
            old_title, new_title, existing.path
        )));
    }
    let source = ctx.resolve(&old_manifest_path);
    let target = ctx.resolve(&new_manifest_path);
    if source != target && target.exists() && source.exists() && !overwrite {
        return Err(Error::conflict(format!(
            "{} already exists",
            new_manifest_path
        )));
    }

    if source != target && source.exists() {
        io::move_file(&source, &target)?;
    }

    if new_title != old_title {
        tracing::info!("Renaming '{}' to '{}'", old_title, new_title);
        let old_cache = ctx.cache_path(&old_title);
        if old_cache.is_file() {
            io::copy_file(&old_cache, &ctx.cache_path(&new_title))?;
        }

        let mut renames = store.renames()?;
        match renames
            .iter_mut()
            .find(|r| r.origin == Origin::Local && r.new_title == old_title)
        {
            // Chained renames collapse onto the title the remote still has
            Some(pending) => {
                pending.new_title = new_title.clone();
                pending.new_path = new_manifest_path.clone();
                if normalize_title(&pending.old_title) != normalize_title(&old_title) {
                    io::remove_if_exists(&old_cache)?;
                }
            }
            None => renames.push(RenameRecord {
                old_title: old_title.clone(),
                new_title: new_title.clone(),
                new_path: new_manifest_path.clone(),
                origin: Origin::Local,
            }),
        }
        renames.retain(|r| r.old_title != r.new_title);
        store.save_renames(&renames)?;
        store.rekey_attributes(&old_title, &new_title)?;
    }

    sheets[idx].title = new_title.clone();
    sheets[idx].path = new_manifest_path.clone();
    store.replace_sheets(&sheets)?;

    Ok(MoveOutcome {
        old_title,
        new_title,
        new_path: new_manifest_path,
    })
}

/// Exclude a sheet from sync. Unknown titles get an ignored record so a
/// remote tab of that name is skipped too.
pub fn ignore(ctx: &ProjectContext, title: &str) -> Result<SheetRecord> {
    let store = ctx.store();
    let mut sheets = store.sheets()?;
    let record = match sheets.iter_mut().find(|s| s.title == title) {
        Some(existing) => {
            existing.ignored = true;
            existing.clone()
        }
        None => {
            let mut record = SheetRecord::new(title, "");
            record.ignored = true;
            sheets.push(record.clone());
            record
        }
    };
    store.replace_sheets(&sheets)?;
    tracing::info!("'{}' is now ignored", title);
    Ok(record)
}

/// Resume syncing an ignored sheet, giving it a local path if it has none.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the title is unknown or not ignored.
pub fn unignore(ctx: &ProjectContext, title: &str) -> Result<SheetRecord> {
    let store = ctx.store();
    let mut sheets = store.sheets()?;
    let Some(idx) = sheets.iter().position(|s| s.title == title) else {
        return Err(Error::invalid_input(format!(
            "'{}' is not a tracked sheet and cannot be reverted",
            title
        )));
    };
    if !sheets[idx].ignored {
        return Err(Error::invalid_input(format!(
            "'{}' is not an ignored sheet and cannot be reverted",
            title
        )));
    }
    if sheets[idx].path.is_empty() {
        let path = new_local_path(&sheets, title);
        tracing::info!("'{}' added to project with local path '{}'", title, path);
        sheets[idx].path = path;
    }
    sheets[idx].ignored = false;
    let record = sheets[idx].clone();
    store.replace_sheets(&sheets)?;
    Ok(record)
}

/// One line of `ls`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SheetListing {
    pub title: String,
    pub path: String,
    pub ignored: bool,
    /// Whether the local file exists
    pub present: bool,
    /// Stem of the cached snapshot
    pub cache_stem: String,
}

/// Every record of `sheet.tsv`, in manifest order.
pub fn list(ctx: &ProjectContext) -> Result<Vec<SheetListing>> {
    Ok(ctx
        .store()
        .sheets()?
        .into_iter()
        .map(|record| SheetListing {
            present: !record.path.is_empty() && ctx.local_path(&record).is_file(),
            cache_stem: normalize_title(&record.title),
            title: record.title,
            path: record.path,
            ignored: record.ignored,
        })
        .collect())
}

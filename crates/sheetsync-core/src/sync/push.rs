//! Upload local sheets and their attributes to the remote

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use sheetsync_fs::io;
use sheetsync_table::grid;

use super::tab_size;
use crate::Result;
use crate::context::ProjectContext;
use crate::manifest::{Manifest, Origin};
use crate::naming::normalize_title;
use crate::remote::{NoteUpdate, ValidationUpdate};
use crate::validation::ValidationRule;

/// What a push changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Titles whose values were uploaded
    pub pushed: Vec<String>,
    /// Tabs created for sheets that had none
    pub created: Vec<String>,
    /// Remote tabs renamed, as `(old, new)`
    pub renamed: Vec<(String, String)>,
    /// Remote tabs deleted because no sheet tracks them
    pub deleted: Vec<String>,
    /// Tracked sheets with no local file
    pub skipped: Vec<String>,
    /// Attribute batches that failed, as messages
    pub attribute_errors: Vec<String>,
}

/// Make the remote mirror the local project.
///
/// Every non-ignored sheet with a local file has its tab cleared and
/// rewritten; tabs of sheets not yet pulled are left as they are. Pending
/// local renames are applied to the tabs, tabs of untracked titles are
/// deleted, and the cache is refreshed from what was uploaded. Cell
/// attributes are pushed last, as three batches.
///
/// # Errors
///
/// Failures of structural calls (listing, clearing, creating, renaming,
/// deleting tabs or writing values) abort the push. Attribute failures are
/// logged and collected in [`PushReport::attribute_errors`].
pub fn push(ctx: &ProjectContext) -> Result<PushReport> {
    let store = ctx.store();
    let manifest = store.load()?;
    let remote = ctx.remote();
    let mut sheets = manifest.sheets.clone();
    let mut report = PushReport::default();

    let local_renames: HashMap<&str, &str> = manifest
        .renames
        .iter()
        .filter(|r| r.origin == Origin::Local)
        .map(|r| (r.old_title.as_str(), r.new_title.as_str()))
        .collect();
    let ignored: BTreeSet<&str> = sheets
        .iter()
        .filter(|s| s.ignored)
        .map(|s| s.title.as_str())
        .collect();

    for tab in remote.list_tabs()? {
        if ignored.contains(tab.title.as_str()) {
            continue;
        }
        if let Some(new_title) = local_renames.get(tab.title.as_str()) {
            tracing::info!("Renaming remote sheet '{}' to '{}'", tab.title, new_title);
            remote.rename_tab(tab.id, new_title)?;
            report.renamed.push((tab.title.clone(), new_title.to_string()));
        }
    }

    let tracked: BTreeSet<String> = sheets.iter().map(|s| s.title.clone()).collect();
    let mut tabs = remote.list_tabs()?;
    for record in sheets.iter_mut().filter(|s| !s.ignored) {
        let local = ctx.local_path(record);
        if record.path.is_empty() || !local.is_file() {
            tracing::warn!("'{}' exists remotely but has not been pulled", record.title);
            report.skipped.push(record.title.clone());
            continue;
        }
        let values = grid::read_grid(&local)?;

        let by_title = tabs.iter().find(|t| t.title == record.title).map(|t| t.id);
        let by_id = record
            .id
            .and_then(|id| tabs.iter().find(|t| t.id == id && !tracked.contains(&t.title)));
        let tab_id = match (by_title, by_id) {
            (Some(id), _) => id,
            (None, Some(tab)) => {
                tracing::info!("Renaming remote sheet '{}' to '{}'", tab.title, record.title);
                remote.rename_tab(tab.id, &record.title)?;
                report.renamed.push((tab.title.clone(), record.title.clone()));
                tab.id
            }
            (None, None) => {
                let (rows, cols) = tab_size(values.len(), grid::max_width(&values));
                let id = remote.create_tab(&record.title, rows, cols)?;
                tracing::info!("Created remote sheet '{}'", record.title);
                report.created.push(record.title.clone());
                id
            }
        };

        remote.clear_tab(tab_id)?;
        remote.set_values(tab_id, &values)?;
        remote.freeze(tab_id, record.frozen_rows, record.frozen_cols)?;
        grid::write_grid(&ctx.cache_path(&record.title), &values)?;
        record.id = Some(tab_id);
        report.pushed.push(record.title.clone());
        tabs = remote.list_tabs()?;
    }

    for tab in remote.list_tabs()? {
        if tracked.contains(&tab.title) {
            continue;
        }
        tracing::info!("Removing remote sheet '{}'", tab.title);
        remote.delete_tab(tab.id)?;
        io::remove_if_exists(&ctx.cache_path(&tab.title))?;
        report.deleted.push(tab.title);
    }
    for (old, new) in &local_renames {
        if normalize_title(old) != normalize_title(new) && !tracked.contains(*old) {
            io::remove_if_exists(&ctx.cache_path(old))?;
        }
    }

    let tab_ids: HashMap<String, u64> = sheets
        .iter()
        .filter(|s| !s.ignored && report.pushed.contains(&s.title))
        .filter_map(|s| s.id.map(|id| (s.title.clone(), id)))
        .collect();
    push_attributes(ctx, &manifest, &tab_ids, &mut report)?;

    store.replace_sheets(&sheets)?;
    super::refresh_fields(ctx, &sheets)?;
    store.clear_renames()?;

    tracing::info!(
        pushed = report.pushed.len(),
        created = report.created.len(),
        deleted = report.deleted.len(),
        "Push complete"
    );
    Ok(report)
}

/// Push validation rules, formats and notes of the uploaded sheets.
fn push_attributes(
    ctx: &ProjectContext,
    manifest: &Manifest,
    tab_ids: &HashMap<String, u64>,
    report: &mut PushReport,
) -> Result<()> {
    let remote = ctx.remote();
    let mut record_failure = |what: &str, e: &dyn std::fmt::Display| {
        tracing::error!("Unable to add {}: {}", what, e);
        report.attribute_errors.push(format!("{}: {}", what, e));
    };

    let validations: Vec<ValidationUpdate> = manifest
        .validations
        .iter()
        .filter_map(|row| {
            let tab = *tab_ids.get(&row.sheet_title)?;
            Some(ValidationUpdate {
                tab,
                range: row.range,
                rule: Some(ValidationRule {
                    condition: row.condition,
                    values: row.values(),
                }),
            })
        })
        .collect();
    if !validations.is_empty()
        && let Err(e) = remote.batch_set_validation(&validations)
    {
        record_failure("data validation", &e);
    }

    let registry = ctx.store().format_registry()?;
    let mut formats: BTreeMap<u64, Vec<_>> = BTreeMap::new();
    for row in &manifest.formats {
        let Some(tab) = tab_ids.get(&row.sheet_title) else {
            continue;
        };
        let Some(format) = registry.get(row.format_id) else {
            tracing::warn!(
                "Format {} used by '{}' {} is not defined",
                row.format_id,
                row.sheet_title,
                row.cell
            );
            continue;
        };
        formats
            .entry(*tab)
            .or_default()
            .push((row.cell, format.clone()));
    }
    for (tab, ranges) in &formats {
        if let Err(e) = remote.set_formats(*tab, ranges) {
            record_failure("formats", &e);
        }
    }

    let notes: Vec<NoteUpdate> = manifest
        .notes
        .iter()
        .filter_map(|row| {
            let tab = *tab_ids.get(&row.sheet_title)?;
            Some(NoteUpdate {
                tab,
                cell: row.cell,
                note: row.note.clone(),
            })
        })
        .collect();
    if !notes.is_empty()
        && let Err(e) = remote.batch_set_notes(&notes)
    {
        record_failure("notes", &e);
    }
    Ok(())
}

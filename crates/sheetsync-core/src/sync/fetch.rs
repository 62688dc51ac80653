//! Download remote tabs into the cache

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use sheetsync_fs::io;
use sheetsync_table::grid;

use crate::Result;
use crate::aggregate::{aggregate_grouped, aggregate_runs};
use crate::context::ProjectContext;
use crate::manifest::{
    FormatRegistry, FormatRow, NoteRow, Origin, RenameRecord, SaveMode, SheetRecord, ValidationRow,
};
use crate::naming::{new_local_path, normalize_title};
use crate::remote::TabInfo;

/// What a fetch changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    /// Titles whose snapshot was written to the cache
    pub downloaded: Vec<String>,
    /// Remote tabs seen for the first time, now tracked
    pub added: Vec<String>,
    /// Remote renames detected by tab id, as `(old, new)`
    pub renamed: Vec<(String, String)>,
    /// Tracked sheets whose tab no longer exists remotely
    pub removed_remote: Vec<String>,
    /// Cache stems deleted because their tab is gone
    pub removed_caches: Vec<String>,
}

/// Attribute rows collected for the fetched tabs, keyed by local title.
#[derive(Default)]
struct Attributes {
    formats: BTreeMap<String, Vec<FormatRow>>,
    notes: BTreeMap<String, Vec<NoteRow>>,
    validations: BTreeMap<String, Vec<ValidationRow>>,
}

/// Download every tracked remote tab into the cache and record its cell
/// attributes in the manifest. Local files are never touched.
///
/// Renames are resolved as follows: a tab still carrying the old title of
/// a pending local rename is stored under the new title; a tab whose id
/// matches a record with a different title is a remote rename and is
/// appended to `renamed.tsv`; any other unknown tab becomes a new tracked
/// sheet with a generated local path.
///
/// # Errors
///
/// Any failed remote read aborts the fetch; manifest tables written so far
/// are left as they were.
pub fn fetch(ctx: &ProjectContext) -> Result<FetchReport> {
    let store = ctx.store();
    let mut sheets = store.sheets()?;
    let mut renames = store.renames()?;
    let mut registry = store.format_registry()?;
    let tabs = ctx.remote().list_tabs()?;

    let local_renames: HashMap<String, String> = renames
        .iter()
        .filter(|r| r.origin == Origin::Local)
        .map(|r| (r.old_title.clone(), r.new_title.clone()))
        .collect();
    let id_to_title: HashMap<u64, String> = sheets
        .iter()
        .filter_map(|s| s.id.map(|id| (id, s.title.clone())))
        .collect();

    let mut report = FetchReport::default();
    let mut attributes = Attributes::default();
    let mut new_renames: Vec<RenameRecord> = Vec::new();

    for tab in &tabs {
        if sheets.iter().any(|s| s.ignored && s.title == tab.title) {
            tracing::info!("Skipping ignored sheet '{}'", tab.title);
            continue;
        }

        let title = if let Some(new_title) = local_renames.get(&tab.title) {
            new_title.clone()
        } else if let Some(local_title) = id_to_title.get(&tab.id)
            && *local_title != tab.title
        {
            tracing::warn!(
                "'{}' was renamed to '{}' remotely; the local file will move on the next pull",
                local_title,
                tab.title
            );
            new_renames.push(RenameRecord {
                old_title: local_title.clone(),
                new_title: tab.title.clone(),
                new_path: format!("{}.tsv", normalize_title(&tab.title)),
                origin: Origin::Remote,
            });
            report.renamed.push((local_title.clone(), tab.title.clone()));
            tab.title.clone()
        } else {
            if !sheets.iter().any(|s| s.title == tab.title) {
                let path = new_local_path(&sheets, &tab.title);
                tracing::info!("New remote sheet '{}' will be pulled to {}", tab.title, path);
                sheets.push(SheetRecord::new(tab.title.clone(), path));
                report.added.push(tab.title.clone());
            }
            tab.title.clone()
        };

        download(ctx, tab, &title, &mut registry, &mut attributes)?;
        if let Some(record) = sheets.iter_mut().find(|s| s.title == title && !s.ignored) {
            record.id = Some(tab.id);
            record.frozen_rows = tab.frozen_rows;
            record.frozen_cols = tab.frozen_cols;
        }
        report.downloaded.push(title);
    }

    let remote_ids: BTreeSet<u64> = tabs.iter().map(|t| t.id).collect();
    for record in sheets.iter().filter(|s| !s.ignored) {
        if let Some(id) = record.id
            && !remote_ids.contains(&id)
        {
            tracing::warn!("'{}' no longer exists remotely", record.title);
            report.removed_remote.push(record.title.clone());
        }
    }

    report.removed_caches = remove_stale_caches(ctx, &tabs, &sheets, &renames, &new_renames, &report)?;

    let renamed_away: Vec<String> = new_renames.iter().map(|r| r.old_title.clone()).collect();
    store.save_attributes(&attributes.formats, &renamed_away, SaveMode::Merge)?;
    store.save_attributes(&attributes.notes, &renamed_away, SaveMode::Merge)?;
    store.save_attributes(&attributes.validations, &renamed_away, SaveMode::Merge)?;
    store.save_format_registry(&registry)?;
    store.replace_sheets(&sheets)?;
    super::refresh_fields(ctx, &sheets)?;

    for rename in new_renames {
        if !renames.iter().any(|r| r.old_title == rename.old_title) {
            renames.push(rename);
        }
    }
    store.save_renames(&renames)?;

    tracing::info!(
        downloaded = report.downloaded.len(),
        added = report.added.len(),
        renamed = report.renamed.len(),
        "Fetch complete"
    );
    Ok(report)
}

/// Write one tab's values to the cache under `title` and collect its
/// attributes.
fn download(
    ctx: &ProjectContext,
    tab: &TabInfo,
    title: &str,
    registry: &mut FormatRegistry,
    attributes: &mut Attributes,
) -> Result<()> {
    let values = ctx.remote().get_values(tab.id)?;
    grid::write_grid(&ctx.cache_path(title), &values)?;
    tracing::debug!(rows = values.len(), "Downloaded '{}'", title);

    let metadata = ctx.remote().get_cell_metadata(tab.id)?;

    let formats = aggregate_runs(
        metadata
            .iter()
            .map(|(cell, meta)| (*cell, meta.format.as_ref().map(|f| registry.id_for(f)))),
    );
    attributes.formats.insert(
        title.to_string(),
        formats
            .into_iter()
            .map(|(cell, format_id)| FormatRow {
                sheet_title: title.to_string(),
                cell,
                format_id,
            })
            .collect(),
    );

    attributes.notes.insert(
        title.to_string(),
        metadata
            .iter()
            .filter_map(|(cell, meta)| {
                meta.note.as_ref().map(|note| NoteRow {
                    sheet_title: title.to_string(),
                    cell: *cell,
                    note: note.clone(),
                })
            })
            .collect(),
    );

    let rules = aggregate_grouped(
        metadata
            .iter()
            .filter_map(|(cell, meta)| meta.validation.clone().map(|rule| (*cell, rule))),
    );
    attributes.validations.insert(
        title.to_string(),
        rules
            .into_iter()
            .map(|(range, rule)| ValidationRow::new(title, range, rule.condition, &rule.values))
            .collect(),
    );
    Ok(())
}

/// Delete cached snapshots whose tab is gone, returning their stems.
///
/// Kept: snapshots of every remote tab (ignored ones included), of pending
/// rename titles, and of sheets that have never been pushed.
fn remove_stale_caches(
    ctx: &ProjectContext,
    tabs: &[TabInfo],
    sheets: &[SheetRecord],
    renames: &[RenameRecord],
    new_renames: &[RenameRecord],
    report: &FetchReport,
) -> Result<Vec<String>> {
    let keep: BTreeSet<String> = tabs
        .iter()
        .map(|t| t.title.as_str())
        .chain(report.downloaded.iter().map(String::as_str))
        .chain(
            renames
                .iter()
                .chain(new_renames)
                .flat_map(|r| [r.old_title.as_str(), r.new_title.as_str()]),
        )
        .chain(sheets.iter().filter(|s| !s.is_pushed()).map(|s| s.title.as_str()))
        .map(normalize_title)
        .collect();

    let mut removed = Vec::new();
    for stem in ctx.cached_stems()? {
        if keep.contains(&stem) {
            continue;
        }
        if io::remove_if_exists(&ctx.cache_path_for_stem(&stem))? {
            tracing::debug!("Removed cached snapshot '{}'", stem);
            removed.push(stem);
        }
    }
    Ok(removed)
}

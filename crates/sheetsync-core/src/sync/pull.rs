//! Copy cached snapshots over local files

use std::collections::BTreeSet;

use serde::Serialize;
use sheetsync_fs::io;
use sheetsync_table::grid;

use crate::Result;
use crate::context::ProjectContext;
use crate::manifest::{Origin, RenameRecord};
use crate::naming::{new_local_path, normalize_title};
use crate::status::{self, ChangeKind};

/// What a pull changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    /// Local files overwritten from the cache
    pub updated: Vec<String>,
    /// Locally modified sheets left alone (pull without force)
    pub kept_local: Vec<String>,
    /// Sheets whose local table could not be compared with the cache
    pub uncompared: Vec<String>,
    /// Remote renames applied locally, as `(old, new)`
    pub renamed: Vec<(String, String)>,
    /// Cache stems deleted because no sheet tracks them
    pub removed_caches: Vec<String>,
}

/// Bring local files up to date with the cache.
///
/// Sheets that are new or modified remotely are written to their local
/// path, converting to the path's format; local edits are only overwritten
/// with `force`. Sheets removed remotely have no snapshot and are left
/// untouched. Pending remote renames are folded into the manifest: the
/// record, its attributes and its local file take the new title.
///
/// # Errors
///
/// Fails on manifest or filesystem errors. Does not call the remote.
pub fn pull(ctx: &ProjectContext, force: bool) -> Result<PullReport> {
    let store = ctx.store();
    let status = status::status(ctx)?;
    let mut sheets = store.sheets()?;
    let renames = store.renames()?;
    let (remote_renames, local_renames): (Vec<RenameRecord>, Vec<RenameRecord>) =
        renames.into_iter().partition(|r| r.origin == Origin::Remote);
    let mut report = PullReport::default();

    for idx in 0..sheets.len() {
        let record = &sheets[idx];
        if record.ignored || remote_renames.iter().any(|r| r.old_title == record.title) {
            continue;
        }
        let cache = ctx.cache_path(&record.title);
        if !cache.is_file() {
            continue;
        }
        match status.kind_of(&record.title) {
            _ if force => {}
            Some(ChangeKind::AddedRemote | ChangeKind::ModifiedRemote | ChangeKind::Unchanged) => {}
            Some(_) => {
                tracing::warn!(
                    "'{}' has local changes; use --force to overwrite them",
                    record.title
                );
                report.kept_local.push(record.title.clone());
                continue;
            }
            None => {
                tracing::warn!(
                    "Could not compare '{}' with its fetched copy; use --force to overwrite it",
                    record.title
                );
                report.uncompared.push(record.title.clone());
                continue;
            }
        }

        if record.path.is_empty() {
            let path = new_local_path(&sheets, &sheets[idx].title);
            sheets[idx].path = path;
        }
        let record = &sheets[idx];
        grid::convert_file(&cache, &ctx.local_path(record))?;
        tracing::debug!("Pulled '{}' to {}", record.title, record.path);
        report.updated.push(record.title.clone());
    }

    for rename in &remote_renames {
        let Some(record) = sheets.iter_mut().find(|s| s.title == rename.old_title) else {
            tracing::warn!("Renamed sheet '{}' is no longer tracked", rename.old_title);
            continue;
        };
        let new_cache = ctx.cache_path(&rename.new_title);
        if new_cache.is_file() {
            let old_local = ctx.resolve(&record.path);
            let new_local = ctx.resolve(&rename.new_path);
            grid::convert_file(&new_cache, &new_local)?;
            if !record.path.is_empty() && old_local != new_local {
                io::remove_if_exists(&old_local)?;
            }
        }
        if normalize_title(&rename.old_title) != normalize_title(&rename.new_title) {
            io::remove_if_exists(&ctx.cache_path(&rename.old_title))?;
        }
        tracing::info!("'{}' is now '{}' at {}", rename.old_title, rename.new_title, rename.new_path);
        record.title = rename.new_title.clone();
        record.path = rename.new_path.clone();
        store.rekey_attributes(&rename.old_title, &rename.new_title)?;
        report.renamed.push((rename.old_title.clone(), rename.new_title.clone()));
    }

    let keep: BTreeSet<String> = sheets
        .iter()
        .map(|s| s.title.as_str())
        .chain(
            local_renames
                .iter()
                .flat_map(|r| [r.old_title.as_str(), r.new_title.as_str()]),
        )
        .map(normalize_title)
        .collect();
    for stem in ctx.cached_stems()? {
        if !keep.contains(&stem) && io::remove_if_exists(&ctx.cache_path_for_stem(&stem))? {
            report.removed_caches.push(stem);
        }
    }

    store.replace_sheets(&sheets)?;
    store.save_renames(&local_renames)?;
    super::refresh_fields(ctx, &sheets)?;

    tracing::info!(
        updated = report.updated.len(),
        kept = report.kept_local.len(),
        renamed = report.renamed.len(),
        "Pull complete"
    );
    Ok(report)
}

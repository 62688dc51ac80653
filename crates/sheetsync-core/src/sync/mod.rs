//! Sync orchestrators
//!
//! - [`fetch`]: remote to cache, plus remote attributes into the manifest
//! - [`push`]: local files and manifest attributes to the remote
//! - [`pull`]: cache to local files, folding pending remote renames
//!
//! Each takes an exclusively opened [`ProjectContext`]. Structural remote
//! failures abort the operation; attribute batches that fail are logged and
//! reported, and the operation carries on.

mod fetch;
mod pull;
mod push;

pub use fetch::{FetchReport, fetch};
pub use pull::{PullReport, pull};
pub use push::{PushReport, push};

use crate::Result;
use crate::context::ProjectContext;
use crate::fields::{collect_headers, merge_fields};
use crate::manifest::SheetRecord;

/// Rebuild `field.tsv` from the headers of every active sheet's local file
/// and cached snapshot.
pub(crate) fn refresh_fields(ctx: &ProjectContext, sheets: &[SheetRecord]) -> Result<()> {
    let mut paths = Vec::new();
    for record in sheets.iter().filter(|s| !s.ignored) {
        if !record.path.is_empty() {
            paths.push(ctx.local_path(record));
        }
        paths.push(ctx.cache_path(&record.title));
    }
    let headers = collect_headers(paths.iter());
    let existing = ctx.store().fields()?;
    ctx.store().save_fields(&merge_fields(&existing, &headers))
}

/// Size of a newly created remote tab holding `rows` x `cols` values.
///
/// Leaves room to grow: at least 500 rows and 20 columns, otherwise ten
/// spare rows and one spare column.
pub(crate) fn tab_size(rows: usize, cols: usize) -> (u32, u32) {
    let rows = if rows < 500 { 500 } else { rows + 10 };
    let cols = if cols < 20 { 20 } else { cols + 1 };
    (
        u32::try_from(rows).unwrap_or(u32::MAX),
        u32::try_from(cols).unwrap_or(u32::MAX),
    )
}

//! Field definitions derived from table headers

use std::collections::HashSet;

use sheetsync_fs::NormalizedPath;
use sheetsync_table::grid;

use crate::manifest::FieldRecord;

/// Datatype given to fields first seen in a table header.
pub const DEFAULT_DATATYPE: &str = "sheetsync:text";

/// Identifier for a header label: lowercase, non-alphanumeric runs become
/// `_`, leading and trailing `_` trimmed.
pub fn field_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            key.push(c);
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_matches('_').to_string()
}

fn field(key: &str, label: &str, datatype: &str, description: &str) -> FieldRecord {
    FieldRecord {
        field: key.to_string(),
        label: label.to_string(),
        datatype: datatype.to_string(),
        description: description.to_string(),
    }
}

/// Fields every project starts with; never pruned.
pub fn builtin_fields() -> Vec<FieldRecord> {
    vec![
        field("sheet", "Sheet", "sheetsync:sql_id", "The identifier for this sheet"),
        field("label", "Label", "sheetsync:label", "The label for this row"),
        field(
            "file_path",
            "File Path",
            "sheetsync:file_path",
            "The relative path of the TSV file for this sheet",
        ),
        field("description", "Description", "sheetsync:text", "A description of this row"),
        field("field", "Field", "sheetsync:sql_id", "The identifier for this field"),
        field("datatype", "Datatype", "sheetsync:curie", "The datatype for this row"),
    ]
}

/// Reconcile `existing` field records with the headers currently in use.
///
/// Headers with no record gain one; records whose key no header uses are
/// dropped unless built in. Existing records keep their label, datatype and
/// description.
pub fn merge_fields(existing: &[FieldRecord], headers: &[String]) -> Vec<FieldRecord> {
    let builtin: HashSet<String> = builtin_fields().into_iter().map(|f| f.field).collect();
    let used: HashSet<String> = headers.iter().map(|h| field_key(h)).collect();

    let mut merged: Vec<FieldRecord> = existing
        .iter()
        .filter(|f| builtin.contains(&f.field) || used.contains(&f.field))
        .cloned()
        .collect();
    let mut known: HashSet<String> = merged.iter().map(|f| f.field.clone()).collect();

    for header in headers {
        let key = field_key(header);
        if key.is_empty() || !known.insert(key.clone()) {
            continue;
        }
        tracing::debug!(field = %key, "Adding field from header");
        merged.push(field(&key, header, DEFAULT_DATATYPE, ""));
    }
    merged
}

/// Header rows of the given tables, concatenated. Unreadable or missing
/// tables contribute nothing.
pub fn collect_headers<'a>(paths: impl IntoIterator<Item = &'a NormalizedPath>) -> Vec<String> {
    let mut headers = Vec::new();
    for path in paths {
        if !path.is_file() {
            continue;
        }
        match grid::read_grid(path) {
            Ok(table) => headers.extend(table.into_iter().next().unwrap_or_default()),
            Err(e) => tracing::warn!("Could not read headers of {}: {}", path, e),
        }
    }
    headers
}

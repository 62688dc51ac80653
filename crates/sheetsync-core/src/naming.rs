//! Derived names: cache file stems, default titles and generated local paths

use std::collections::HashSet;

use sheetsync_fs::NormalizedPath;

use crate::manifest::SheetRecord;

/// Lowercase the title and collapse every run of non-alphanumeric
/// characters into `_`.
///
/// `"Gene Sets (v2)"` becomes `"gene_sets_v2_"`. This is the stem of the
/// sheet's cached snapshot.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_gap = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push('_');
            in_gap = true;
        }
    }
    out
}

/// File name of the cached snapshot for a sheet title.
pub fn cache_file_name(title: &str) -> String {
    format!("{}.tsv", normalize_title(title))
}

/// Stem of a cached snapshot file name (text before the first dot).
pub fn cache_stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Sheet title implied by a local path: its base name up to the first dot.
pub fn title_from_path(path: &str) -> Option<String> {
    NormalizedPath::new(path).file_stem().map(str::to_string)
}

/// A local path for a sheet that has none yet, unique among `records`.
///
/// Uses the normalized title with leading/trailing underscores trimmed and a
/// `.tsv` extension; on collision a timestamp suffix is appended.
pub fn new_local_path(records: &[SheetRecord], title: &str) -> String {
    let taken: HashSet<&str> = records.iter().map(|r| r.path.as_str()).collect();
    let normalized = normalize_title(title);
    let base = normalized.trim_matches('_');
    let base = if base.is_empty() { "sheet" } else { base };

    let candidate = format!("{}.tsv", base);
    if !taken.contains(candidate.as_str()) {
        return candidate;
    }
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.tsv", base, stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Genes", "genes")]
    #[case("Gene Sets (v2)", "gene_sets_v2_")]
    #[case("a--b", "a_b")]
    #[case("Ünïcode", "_n_code")]
    fn normalizes_titles(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(normalize_title(title), expected);
    }

    #[test]
    fn title_from_path_uses_first_dot() {
        assert_eq!(title_from_path("data/genes.v2.tsv").as_deref(), Some("genes"));
        assert_eq!(title_from_path("data/"), Some("data".to_string()));
    }

    #[test]
    fn new_local_path_avoids_collisions() {
        let mut record = SheetRecord::new("Genes", "genes.tsv");
        record.id = Some(1);
        let records = vec![record];

        assert_eq!(new_local_path(&records, "Variants"), "variants.tsv");
        let generated = new_local_path(&records, "Genes");
        assert!(generated.starts_with("genes_"), "got {}", generated);
        assert!(generated.ends_with(".tsv"));
    }
}

use rstest::rstest;
use sheetsync_fs::NormalizedPath;

#[rstest]
#[case("data/genes.tsv", "data/genes.tsv")]
#[case("data\\genes.tsv", "data/genes.tsv")]
#[case("./genes.tsv", "genes.tsv")]
#[case("././genes.tsv", "genes.tsv")]
fn test_normalization(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::new(input).as_str(), expected);
}

#[test]
fn test_join_paths() {
    let base = NormalizedPath::new(".sheetsync");
    assert_eq!(base.join("tracked").as_str(), ".sheetsync/tracked");
}

#[test]
fn test_join_onto_empty_path() {
    let base = NormalizedPath::new("");
    assert_eq!(base.join("genes.tsv").as_str(), "genes.tsv");
}

#[test]
fn test_parent() {
    let path = NormalizedPath::new("data/tables/genes.tsv");
    assert_eq!(path.parent().unwrap().as_str(), "data/tables");
    assert!(NormalizedPath::new("genes.tsv").parent().is_none());
}

#[rstest]
#[case("data/genes.tsv", Some("genes"))]
#[case("genes.v2.tsv", Some("genes"))]
#[case("README", Some("README"))]
#[case(".hidden", None)]
fn test_file_stem(#[case] input: &str, #[case] expected: Option<&str>) {
    assert_eq!(NormalizedPath::new(input).file_stem(), expected);
}

#[rstest]
#[case("genes.tsv", Some("tsv"), false)]
#[case("genes.CSV", Some("CSV"), true)]
#[case("genes", None, false)]
fn test_extension(#[case] input: &str, #[case] ext: Option<&str>, #[case] csv: bool) {
    let path = NormalizedPath::new(input);
    assert_eq!(path.extension(), ext);
    assert_eq!(path.is_csv(), csv);
}

#[test]
fn test_modified_missing_file_is_none() {
    let path = NormalizedPath::new("/nonexistent/path/genes.tsv");
    assert!(!path.exists());
    assert!(path.modified().is_none());
}

#[test]
fn test_absolute_resolves_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("genes.tsv");
    std::fs::write(&file, "").unwrap();

    let absolute = NormalizedPath::new(&file).absolute();
    assert!(absolute.as_str().ends_with("/genes.tsv"));
    assert!(absolute.to_native().is_absolute());
}

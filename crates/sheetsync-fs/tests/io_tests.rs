use sheetsync_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".sheetsync/tracked/genes.tsv"));

    io::write_atomic(&path, b"id\tname\n").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "id\tname\n");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("sheet.tsv");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("note.tsv"));

    io::write_text(&path, "Sheet Title\tCell\tNote\n").unwrap();

    let entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["note.tsv".to_string()]);
}

#[test]
fn test_write_atomic_onto_directory_fails_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("tracked")).unwrap();
    fs::write(temp.path().join("tracked/genes.tsv"), "id\n").unwrap();
    let path = NormalizedPath::new(temp.path().join("tracked"));

    assert!(io::write_atomic(&path, b"id\n1\n").is_err());

    let mut entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["tracked".to_string()]);
    assert!(temp.path().join("tracked/genes.tsv").is_file());
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/file.tsv");
    assert!(io::read_text(&path).is_err());
}

#[test]
fn test_copy_file_replaces_destination() {
    let temp = TempDir::new().unwrap();
    let from = NormalizedPath::new(temp.path().join("cache.tsv"));
    let to = NormalizedPath::new(temp.path().join("local/genes.tsv"));
    fs::write(from.to_native(), "a\tb\n").unwrap();

    io::copy_file(&from, &to).unwrap();

    assert_eq!(fs::read_to_string(to.to_native()).unwrap(), "a\tb\n");
    assert!(from.exists());
}

#[test]
fn test_remove_if_exists_reports_whether_removed() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("stale.tsv"));
    fs::write(path.to_native(), "x").unwrap();

    assert!(io::remove_if_exists(&path).unwrap());
    assert!(!io::remove_if_exists(&path).unwrap());
}

#[test]
fn test_move_file_relocates_content() {
    let temp = TempDir::new().unwrap();
    let from = NormalizedPath::new(temp.path().join("genes.tsv"));
    let to = NormalizedPath::new(temp.path().join("data/proteins.tsv"));
    fs::write(from.to_native(), "id\n").unwrap();

    io::move_file(&from, &to).unwrap();

    assert!(!from.exists());
    assert_eq!(fs::read_to_string(to.to_native()).unwrap(), "id\n");
}

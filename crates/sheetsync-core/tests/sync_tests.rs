//! End-to-end fetch / push / pull cycles against an in-memory remote

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use sheetsync_core::manifest::{FormatRow, NoteRow, SaveMode, ValidationRow};
use sheetsync_core::project;
use sheetsync_core::validation::ConditionKind;
use sheetsync_core::{ChangeKind, Spreadsheet, fetch, pull, push, status};
use sheetsync_table::{CellAddress, CellRange};
use sheetsync_test_utils::TestProject;

const GENES: &str = "id\tname\n1\tTP53\n2\tBRCA1\n";
const SAMPLES: &str = "sample,gene\nS1,1\nS2,2\n";

fn cell(a1: &str) -> CellAddress {
    CellAddress::parse(a1).unwrap()
}

fn range(a1: &str) -> CellRange {
    CellRange::parse(a1).unwrap()
}

/// A project with `genes.tsv` and `samples.csv` pushed and fetched back.
fn synced_project() -> TestProject {
    let project = TestProject::new("Genes project");
    project.add_sheet("genes.tsv", GENES);
    project.add_sheet("samples.csv", SAMPLES);
    let ctx = project.context();
    push(&ctx).unwrap();
    fetch(&ctx).unwrap();
    project
}

// ==========================================================================
// Push
// ==========================================================================

#[test]
fn test_push_creates_one_tab_per_sheet() {
    let project = TestProject::new("Genes project");
    project.add_sheet("genes.tsv", GENES);
    project.add_sheet("samples.csv", SAMPLES);

    let report = push(&project.context()).unwrap();

    assert_eq!(report.created, vec!["genes", "samples"]);
    assert_eq!(report.deleted, vec!["Sheet1"]);
    project.assert_tab_values(
        "genes",
        &[&["id", "name"], &["1", "TP53"], &["2", "BRCA1"]],
    );
    project.assert_tab_values(
        "samples",
        &[&["sample", "gene"], &["S1", "1"], &["S2", "2"]],
    );

    let sheets = project.read_only().store().sheets().unwrap();
    assert!(sheets.iter().all(|s| s.is_pushed()));
    assert_eq!(project.cached("samples").unwrap(), "sample\tgene\nS1\t1\nS2\t2\n");
}

#[test]
fn test_push_then_fetch_is_unchanged() {
    let project = synced_project();

    let report = status(&project.read_only()).unwrap();

    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.kind_of("genes"), Some(ChangeKind::Unchanged));
    assert_eq!(report.kind_of("samples"), Some(ChangeKind::Unchanged));
}

#[test]
fn test_push_sizes_and_freezes_new_tabs() {
    let project = TestProject::new("P");
    project.add_sheet("genes.tsv", GENES);
    {
        let ctx = project.context();
        let store = ctx.store();
        let mut sheets = store.sheets().unwrap();
        sheets[0].frozen_rows = 1;
        store.replace_sheets(&sheets).unwrap();
        push(&ctx).unwrap();
    }

    let tab = project.tab("genes").unwrap();
    assert_eq!((tab.rows, tab.cols), (500, 20));
    assert_eq!((tab.frozen_rows, tab.frozen_cols), (1, 0));
}

#[test]
fn test_push_skips_sheet_without_local_file() {
    let project = synced_project();
    std::fs::remove_file(project.root().join("samples.csv")).unwrap();

    let report = push(&project.context()).unwrap();

    assert_eq!(report.skipped, vec!["samples"]);
    project.assert_tab_values(
        "samples",
        &[&["sample", "gene"], &["S1", "1"], &["S2", "2"]],
    );
}

#[test]
fn test_push_before_pull_keeps_new_remote_tab() {
    let project = synced_project();
    let id = project.remote().create_tab("Primers", 100, 5).unwrap();
    project
        .remote()
        .set_values(id, &[vec!["primer".into()], vec!["P1".into()]])
        .unwrap();
    fetch(&project.context()).unwrap();

    let report = push(&project.context()).unwrap();

    assert_eq!(report.skipped, vec!["Primers"]);
    assert!(report.deleted.is_empty());
    project.assert_tab_values("Primers", &[&["primer"], &["P1"]]);

    let ctx = project.context();
    fetch(&ctx).unwrap();
    pull(&ctx, false).unwrap();
    assert_eq!(project.read("primers.tsv"), "primer\nP1\n");
}

#[test]
fn test_push_reports_attribute_failure_and_keeps_values() {
    let project = TestProject::new("P");
    project.add_sheet("genes.tsv", GENES);
    {
        let ctx = project.context();
        let notes = BTreeMap::from([(
            "genes".to_string(),
            vec![NoteRow {
                sheet_title: "genes".into(),
                cell: cell("B2"),
                note: "check symbol".into(),
            }],
        )]);
        ctx.store()
            .save_attributes(&notes, &[], SaveMode::Merge)
            .unwrap();
    }
    project.remote().fail_operation("batch_set_notes");

    let report = push(&project.context()).unwrap();

    assert_eq!(report.attribute_errors.len(), 1);
    assert!(report.attribute_errors[0].contains("batch_set_notes"));
    project.assert_tab_values(
        "genes",
        &[&["id", "name"], &["1", "TP53"], &["2", "BRCA1"]],
    );
}

#[test]
fn test_push_value_failure_is_an_error() {
    let project = TestProject::new("P");
    project.add_sheet("genes.tsv", GENES);
    project.remote().fail_operation("set_values");

    let err = push(&project.context()).unwrap_err();

    assert!(matches!(err, sheetsync_core::Error::Remote(_)));
}

// ==========================================================================
// Fetch
// ==========================================================================

#[test]
fn test_fetch_tracks_new_remote_tab() {
    let project = synced_project();
    let id = project.remote().create_tab("Extra Data", 500, 20).unwrap();
    project
        .remote()
        .set_values(id, &[vec!["a".into(), "b".into()], vec!["1".into(), "2".into()]])
        .unwrap();

    let report = fetch(&project.context()).unwrap();

    assert_eq!(report.added, vec!["Extra Data"]);
    let sheets = project.read_only().store().sheets().unwrap();
    let extra = sheets.iter().find(|s| s.title == "Extra Data").unwrap();
    assert_eq!(extra.path, "extra_data.tsv");
    assert_eq!(extra.id, Some(id));

    let st = status(&project.read_only()).unwrap();
    assert_eq!(st.kind_of("Extra Data"), Some(ChangeKind::AddedRemote));
}

#[test]
fn test_fetch_detects_remote_modification() {
    let project = synced_project();
    project.backdate("genes.tsv", 60);
    project.edit_tab("genes", &[&["id", "name"], &["1", "TP53"], &["3", "EGFR"]]);

    fetch(&project.context()).unwrap();

    let st = status(&project.read_only()).unwrap();
    let genes = st.get("genes").unwrap();
    assert_eq!(genes.kind, ChangeKind::ModifiedRemote);
    assert!(genes.summary.is_some());
}

#[test]
fn test_fetch_detects_remote_rename() {
    let project = synced_project();
    let id = project.tab("genes").unwrap().id;
    project.remote().rename_tab(id, "Gene List").unwrap();

    let report = fetch(&project.context()).unwrap();

    assert_eq!(report.renamed, vec![("genes".to_string(), "Gene List".to_string())]);
    let st = status(&project.read_only()).unwrap();
    let renamed: Vec<_> = st.of_kind(ChangeKind::RenamedRemote).collect();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].title, "Gene List");
    assert_eq!(renamed[0].renamed_from.as_deref(), Some("genes"));
    assert_eq!(renamed[0].path.as_deref(), Some("gene_list.tsv"));
}

#[test]
fn test_fetch_keeps_record_of_deleted_tab() {
    let project = synced_project();
    let id = project.tab("genes").unwrap().id;
    project.remote().delete_tab(id).unwrap();

    let report = fetch(&project.context()).unwrap();

    assert_eq!(report.removed_remote, vec!["genes"]);
    assert!(project.cached("genes").is_none());
    let sheets = project.read_only().store().sheets().unwrap();
    assert!(sheets.iter().any(|s| s.title == "genes"));

    let st = status(&project.read_only()).unwrap();
    assert_eq!(st.kind_of("genes"), Some(ChangeKind::RemovedRemote));
}

#[test]
fn test_fetch_skips_ignored_tabs() {
    let project = synced_project();
    sheetsync_core::project::ignore(&project.context(), "Scratch").unwrap();
    let id = project.remote().create_tab("Scratch", 500, 20).unwrap();
    project
        .remote()
        .set_values(id, &[vec!["x".into()]])
        .unwrap();

    let report = fetch(&project.context()).unwrap();

    assert!(!report.downloaded.contains(&"Scratch".to_string()));
    assert!(report.added.is_empty());
    assert!(project.cached("Scratch").is_none());
}

// ==========================================================================
// Pull
// ==========================================================================

#[test]
fn test_pull_writes_remote_changes() {
    let project = synced_project();
    project.backdate("genes.tsv", 60);
    project.edit_tab("genes", &[&["id", "name"], &["1", "TP53"], &["3", "EGFR"]]);
    fetch(&project.context()).unwrap();

    let report = pull(&project.context(), false).unwrap();

    assert!(report.updated.contains(&"genes".to_string()));
    assert_eq!(project.read("genes.tsv"), "id\tname\n1\tTP53\n3\tEGFR\n");
    assert!(status(&project.read_only()).unwrap().is_clean());
}

#[test]
fn test_pull_keeps_local_edits_unless_forced() {
    let project = synced_project();
    let edited = "id\tname\n1\tTP53\n2\tBRCA2\n";
    project.write("genes.tsv", edited);

    let report = pull(&project.context(), false).unwrap();
    assert_eq!(report.kept_local, vec!["genes"]);
    assert_eq!(project.read("genes.tsv"), edited);

    let report = pull(&project.context(), true).unwrap();
    assert!(report.updated.contains(&"genes".to_string()));
    assert_eq!(project.read("genes.tsv"), GENES);
}

#[test]
fn test_pull_keeps_table_it_cannot_compare() {
    let project = synced_project();
    let unreadable: &[u8] = &[b'i', b'd', b'\t', 0xff, 0xfe, b'\n'];
    std::fs::write(project.root().join("genes.tsv"), unreadable).unwrap();

    let report = pull(&project.context(), false).unwrap();

    assert_eq!(report.uncompared, vec!["genes"]);
    assert!(report.kept_local.is_empty());
    assert_eq!(std::fs::read(project.root().join("genes.tsv")).unwrap(), unreadable);

    let report = pull(&project.context(), true).unwrap();
    assert!(report.updated.contains(&"genes".to_string()));
    assert_eq!(project.read("genes.tsv"), GENES);
}

#[test]
fn test_pull_converts_cache_to_csv() {
    let project = synced_project();
    project.backdate("samples.csv", 60);
    project.edit_tab("samples", &[&["sample", "gene"], &["S9", "3, 4"]]);
    fetch(&project.context()).unwrap();

    pull(&project.context(), false).unwrap();

    assert_eq!(project.read("samples.csv"), "sample,gene\nS9,\"3, 4\"\n");
}

#[test]
fn test_pull_leaves_removed_remote_sheet_untouched() {
    let project = TestProject::new("P");
    project.add_sheet("genes.tsv", GENES);
    {
        let ctx = project.context();
        let store = ctx.store();
        let mut sheets = store.sheets().unwrap();
        sheets[0].title = "Genes".into();
        sheets[0].id = Some(42);
        store.replace_sheets(&sheets).unwrap();
    }

    let st = status(&project.read_only()).unwrap();
    assert_eq!(st.kind_of("Genes"), Some(ChangeKind::RemovedRemote));

    let report = pull(&project.context(), false).unwrap();

    assert!(report.updated.is_empty());
    assert_eq!(project.read("genes.tsv"), GENES);
}

#[test]
fn test_pull_folds_remote_rename() {
    let project = synced_project();
    let id = project.tab("genes").unwrap().id;
    project.remote().rename_tab(id, "Gene List").unwrap();
    fetch(&project.context()).unwrap();

    let report = pull(&project.context(), false).unwrap();

    assert_eq!(report.renamed, vec![("genes".to_string(), "Gene List".to_string())]);
    project.assert_file_exists("gene_list.tsv");
    project.assert_file_not_exists("genes.tsv");
    assert_eq!(project.read("gene_list.tsv"), GENES);

    let ctx = project.read_only();
    let manifest = ctx.store().load().unwrap();
    let record = manifest.sheet("Gene List").unwrap();
    assert_eq!(record.path, "gene_list.tsv");
    assert_eq!(record.id, Some(id));
    assert!(manifest.sheet("genes").is_none());
    assert!(manifest.renames.is_empty());
    assert!(status(&ctx).unwrap().is_clean());
}

// ==========================================================================
// Renames and attributes across a full cycle
// ==========================================================================

#[test]
fn test_local_rename_propagates_to_remote_and_attributes() {
    let project = TestProject::new("P");
    project.add_sheet("genes.tsv", GENES);
    project.add_sheet("samples.csv", SAMPLES);
    {
        let ctx = project.context();
        let store = ctx.store();
        let formats = BTreeMap::from([(
            "genes".to_string(),
            vec![FormatRow {
                sheet_title: "genes".into(),
                cell: range("A1:B1"),
                format_id: 0,
            }],
        )]);
        let notes = BTreeMap::from([(
            "genes".to_string(),
            vec![NoteRow {
                sheet_title: "genes".into(),
                cell: cell("B2"),
                note: "ERROR: symbol\nunknown".into(),
            }],
        )]);
        let validations = BTreeMap::from([(
            "genes".to_string(),
            vec![ValidationRow::new(
                "genes",
                range("A2:A3"),
                ConditionKind::NumberGreater,
                &["0".to_string()],
            )],
        )]);
        store.save_attributes(&formats, &[], SaveMode::Merge).unwrap();
        store.save_attributes(&notes, &[], SaveMode::Merge).unwrap();
        store.save_attributes(&validations, &[], SaveMode::Merge).unwrap();
        push(&ctx).unwrap();
    }

    let outcome = sheetsync_core::project::mv(
        &project.context(),
        &project.root().join("genes.tsv"),
        &project.root().join("gene_list.tsv"),
        false,
    )
    .unwrap();
    assert!(outcome.renamed());
    assert_eq!(outcome.new_title, "gene_list");

    let st = status(&project.read_only()).unwrap();
    assert_eq!(st.of_kind(ChangeKind::RenamedLocal).count(), 1);
    assert_eq!(st.kind_of("gene_list"), Some(ChangeKind::Unchanged));

    {
        let ctx = project.context();
        let report = push(&ctx).unwrap();
        assert_eq!(report.renamed, vec![("genes".to_string(), "gene_list".to_string())]);
        assert!(report.attribute_errors.is_empty());
        fetch(&ctx).unwrap();
    }

    assert!(project.tab("genes").is_none());
    project.assert_tab_values(
        "gene_list",
        &[&["id", "name"], &["1", "TP53"], &["2", "BRCA1"]],
    );

    let ctx = project.read_only();
    let manifest = ctx.store().load().unwrap();
    assert!(manifest.renames.is_empty());
    assert!(manifest.formats.iter().all(|r| r.sheet_title == "gene_list"));
    assert!(manifest.notes.iter().all(|r| r.sheet_title == "gene_list"));
    assert!(manifest.validations.iter().all(|r| r.sheet_title == "gene_list"));
    assert_eq!(
        manifest.formats,
        vec![FormatRow {
            sheet_title: "gene_list".into(),
            cell: range("A1:B1"),
            format_id: 0,
        }]
    );
    assert_eq!(manifest.notes.len(), 1);
    assert_eq!(manifest.notes[0].note, "ERROR: symbol\nunknown");
    assert_eq!(manifest.validations.len(), 1);
    assert_eq!(manifest.validations[0].range, range("A2:A3"));
    assert!(status(&ctx).unwrap().is_clean());
}

#[test]
fn test_rm_reads_as_removed_local_until_push() {
    let project = synced_project();

    project::rm(&project.context(), &[project.root().join("genes.tsv")]).unwrap();

    let st = status(&project.read_only()).unwrap();
    assert_eq!(st.kind_of("genes"), Some(ChangeKind::RemovedLocal));
    assert_eq!(st.kind_of("samples"), Some(ChangeKind::Unchanged));
    assert!(project.tab("genes").is_some());

    let report = push(&project.context()).unwrap();

    assert_eq!(report.deleted, vec!["genes"]);
    assert!(project.tab("genes").is_none());
    assert!(project.cached("genes").is_none());
    let st = status(&project.read_only()).unwrap();
    assert_eq!(st.kind_of("genes"), None);
    assert!(st.is_clean(), "{:?}", st);
}

#[test]
fn test_status_is_idempotent() {
    let project = synced_project();
    project.write("genes.tsv", "id\tname\n1\tTP53\n");
    project.add_sheet("extra.tsv", "a\n1\n");

    let first = status(&project.read_only()).unwrap();
    let second = status(&project.read_only()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.kind_of("genes"), Some(ChangeKind::ModifiedLocal));
    assert_eq!(first.kind_of("extra"), Some(ChangeKind::AddedLocal));
}

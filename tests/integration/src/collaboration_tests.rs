//! Cross-crate workflows: two projects sharing one file-backed spreadsheet,
//! and attributes travelling from a message table to the remote cells.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use pretty_assertions::assert_eq;
use sheetsync_core::project::{self, AddOptions, InitOptions};
use sheetsync_core::{
    Access, ChangeKind, FileSpreadsheet, ProjectContext, Spreadsheet, fetch, pull, push, status,
};
use sheetsync_fs::NormalizedPath;
use sheetsync_table::{CellAddress, grid};
use sheetsync_test_utils::TestProject;
use tempfile::TempDir;

const GENES: &str = "id\tname\n1\tTP53\n2\tBRCA1\n";

/// Two project directories and the spreadsheet file they share.
struct Team {
    _temp: TempDir,
    alice: NormalizedPath,
    bob: NormalizedPath,
    remote: NormalizedPath,
}

impl Team {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = NormalizedPath::new(temp.path());
        let alice = base.join("alice");
        let bob = base.join("bob");
        fs::create_dir_all(alice.to_native()).unwrap();
        fs::create_dir_all(bob.to_native()).unwrap();
        let remote = base.join("shared.json");
        FileSpreadsheet::create(remote.clone(), "Gene annotations").unwrap();

        for root in [&alice, &bob] {
            let spreadsheet = FileSpreadsheet::open(remote.clone()).unwrap();
            project::init(
                root,
                &spreadsheet,
                &InitOptions {
                    title: "Gene annotations".into(),
                    remote: Some(remote.as_str().to_string()),
                },
            )
            .unwrap();
        }
        Self {
            _temp: temp,
            alice,
            bob,
            remote,
        }
    }

    fn open(&self, root: &NormalizedPath) -> ProjectContext {
        ProjectContext::open_with_file_remote(root.clone(), Access::Exclusive).unwrap()
    }

    fn tab_titles(&self) -> Vec<String> {
        FileSpreadsheet::open(self.remote.clone())
            .unwrap()
            .list_tabs()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect()
    }
}

fn write(root: &NormalizedPath, path: &str, content: &str) {
    fs::write(root.join(path).to_native(), content).unwrap();
}

fn read(root: &NormalizedPath, path: &str) -> String {
    fs::read_to_string(root.join(path).to_native()).unwrap()
}

fn age(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(secs))
        .unwrap();
}

/// Alice tracks and pushes `genes.tsv`; Bob fetches and pulls it.
fn shared_genes() -> Team {
    let team = Team::new();
    write(&team.alice, "genes.tsv", GENES);
    {
        let ctx = team.open(&team.alice);
        project::add(&ctx, &team.alice.join("genes.tsv").to_native(), &AddOptions::default()).unwrap();
        push(&ctx).unwrap();
    }
    {
        let ctx = team.open(&team.bob);
        fetch(&ctx).unwrap();
        pull(&ctx, false).unwrap();
    }
    team
}

#[test]
fn test_both_projects_point_at_the_same_spreadsheet() {
    let team = Team::new();
    let alice = team.open(&team.alice);
    let bob = team.open(&team.bob);

    assert_eq!(alice.config().spreadsheet_id, bob.config().spreadsheet_id);
    assert_eq!(alice.config().remote_path(&team.alice), team.remote);
}

#[test]
fn test_pushed_sheet_reaches_collaborator() {
    let team = shared_genes();

    assert_eq!(team.tab_titles(), vec!["genes"]);
    assert_eq!(read(&team.bob, "genes.tsv"), GENES);

    let ctx = team.open(&team.bob);
    let report = status(&ctx).unwrap();
    assert!(report.is_clean(), "{:?}", report);
}

#[test]
fn test_collaborator_edit_round_trips() {
    let team = shared_genes();

    write(&team.bob, "genes.tsv", "id\tname\n1\tTP53\n2\tBRCA2\n");
    {
        let ctx = team.open(&team.bob);
        age(&ctx.cache_path("genes").to_native(), 60);
        assert_eq!(status(&ctx).unwrap().kind_of("genes"), Some(ChangeKind::ModifiedLocal));
        let report = push(&ctx).unwrap();
        assert_eq!(report.pushed, vec!["genes"]);
    }

    age(&team.alice.join("genes.tsv").to_native(), 60);
    let ctx = team.open(&team.alice);
    fetch(&ctx).unwrap();
    assert_eq!(status(&ctx).unwrap().kind_of("genes"), Some(ChangeKind::ModifiedRemote));

    let report = pull(&ctx, false).unwrap();
    assert_eq!(report.updated, vec!["genes"]);
    assert_eq!(read(&team.alice, "genes.tsv"), "id\tname\n1\tTP53\n2\tBRCA2\n");
}

#[test]
fn test_conflicting_edit_is_kept_without_force() {
    let team = shared_genes();

    write(&team.bob, "genes.tsv", "id\tname\n1\tTP53\n2\tBRCA2\n");
    {
        let ctx = team.open(&team.bob);
        age(&ctx.cache_path("genes").to_native(), 60);
        push(&ctx).unwrap();
    }

    write(&team.alice, "genes.tsv", "id\tname\n1\tTP53\n2\tATM\n");
    let ctx = team.open(&team.alice);
    fetch(&ctx).unwrap();
    age(&ctx.cache_path("genes").to_native(), 60);

    let report = pull(&ctx, false).unwrap();
    assert_eq!(report.kept_local, vec!["genes"]);
    assert!(read(&team.alice, "genes.tsv").contains("ATM"));

    let report = pull(&ctx, true).unwrap();
    assert_eq!(report.updated, vec!["genes"]);
    assert!(read(&team.alice, "genes.tsv").contains("BRCA2"));
}

#[test]
fn test_rename_by_one_collaborator_moves_the_others_file() {
    let team = shared_genes();
    {
        let ctx = team.open(&team.alice);
        project::mv(
            &ctx,
            &team.alice.join("genes.tsv").to_native(),
            &team.alice.join("gene_list.tsv").to_native(),
            false,
        )
        .unwrap();
        let report = push(&ctx).unwrap();
        assert_eq!(report.renamed, vec![("genes".to_string(), "gene_list".to_string())]);
    }
    assert_eq!(team.tab_titles(), vec!["gene_list"]);

    let ctx = team.open(&team.bob);
    fetch(&ctx).unwrap();
    assert_eq!(status(&ctx).unwrap().kind_of("gene_list"), Some(ChangeKind::RenamedRemote));
    pull(&ctx, false).unwrap();

    assert!(!team.bob.join("genes.tsv").exists());
    assert_eq!(read(&team.bob, "gene_list.tsv"), GENES);
}

#[test]
fn test_message_table_lands_on_remote_cells() {
    let project = TestProject::new("P");
    project.add_sheet("genes.tsv", GENES);
    project.write(
        "messages.tsv",
        "table\tcell\tlevel\trule\ngenes\tB3\terror\tunknown symbol\n",
    );
    {
        let ctx = project.context();
        project::apply(&ctx, &[project.root().join("messages.tsv")]).unwrap();
        let report = push(&ctx).unwrap();
        assert!(report.attribute_errors.is_empty(), "{:?}", report.attribute_errors);
    }

    let tab = project.tab("genes").unwrap();
    let metadata = &tab.cells[&CellAddress::parse("B3").unwrap()];
    assert_eq!(metadata.note.as_deref(), Some("ERROR: unknown symbol"));
    assert!(metadata.format.is_some());
}

#[test]
fn test_csv_table_is_cached_as_tsv() {
    let project = TestProject::new("P");
    project.add_sheet("samples.csv", "sample,genes\nS1,\"TP53, ATM\"\n");
    {
        let ctx = project.context();
        push(&ctx).unwrap();
        fetch(&ctx).unwrap();
    }

    let cache = project.read_only().cache_path("samples");
    let rows = grid::read_grid(&cache).unwrap();
    assert_eq!(rows[1], vec!["S1".to_string(), "TP53, ATM".to_string()]);
    assert!(project.cached("samples").unwrap().contains("S1\tTP53, ATM"));
}

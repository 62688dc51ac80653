//! [`TestProject`] builder for sheetsync test scenarios.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use sheetsync_core::project::{self, AddOptions, InitOptions};
use sheetsync_core::remote::RemoteTab;
use sheetsync_core::{Access, MemorySpreadsheet, ProjectContext, SheetRecord, Spreadsheet};
use sheetsync_fs::NormalizedPath;
use tempfile::TempDir;

/// An initialized project in a temporary directory, synced against a
/// [`MemorySpreadsheet`].
///
/// # Example
///
/// ```rust,no_run
/// use sheetsync_test_utils::TestProject;
///
/// let project = TestProject::new("Genes project");
/// project.add_sheet("genes.tsv", "id\tname\n1\tTP53\n");
/// sheetsync_core::push(&project.context()).unwrap();
/// project.assert_tab_values("genes", &[&["id", "name"], &["1", "TP53"]]);
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    remote: MemorySpreadsheet,
}

impl TestProject {
    /// Create and initialize a project titled `title`.
    pub fn new(title: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let remote = MemorySpreadsheet::new(title);
        project::init(
            &NormalizedPath::new(temp_dir.path()),
            &remote,
            &InitOptions {
                title: title.to_string(),
                remote: None,
            },
        )
        .expect("TestProject::new: init failed");
        Self { temp_dir, remote }
    }

    /// Root directory of the project.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Handle on the remote; shares state with every context opened here.
    pub fn remote(&self) -> &MemorySpreadsheet {
        &self.remote
    }

    /// Open the project for a mutating command.
    pub fn context(&self) -> ProjectContext {
        self.open(Access::Exclusive)
    }

    /// Open the project without taking the lock.
    pub fn read_only(&self) -> ProjectContext {
        self.open(Access::ReadOnly)
    }

    fn open(&self, access: Access) -> ProjectContext {
        ProjectContext::open(
            NormalizedPath::new(self.root()),
            Box::new(self.remote.clone()),
            access,
        )
        .expect("TestProject: could not open project")
    }

    /// Write `content` to `path`, relative to the root.
    pub fn write(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
    }

    /// Contents of `path`, relative to the root.
    pub fn read(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Set the modification time of `path` to `secs` seconds ago.
    pub fn backdate(&self, path: &str, secs: u64) {
        let file = fs::File::options()
            .write(true)
            .open(self.root().join(path))
            .unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .unwrap();
    }

    /// Write a local table and start tracking it.
    pub fn add_sheet(&self, path: &str, content: &str) -> SheetRecord {
        self.write(path, content);
        project::add(&self.context(), &self.root().join(path), &AddOptions::default())
            .expect("TestProject::add_sheet: add failed")
    }

    /// Contents of the cached snapshot of `title`.
    pub fn cached(&self, title: &str) -> Option<String> {
        let path = self.read_only().cache_path(title);
        fs::read_to_string(path.to_native()).ok()
    }

    /// The remote tab titled `title`.
    pub fn tab(&self, title: &str) -> Option<RemoteTab> {
        self.remote.document().tab_by_title(title).cloned()
    }

    /// Replace a remote tab's values as a collaborator would.
    pub fn edit_tab(&self, title: &str, rows: &[&[&str]]) {
        let tab = self
            .tab(title)
            .unwrap_or_else(|| panic!("No remote tab titled '{}'", title));
        let values: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        self.remote.clear_tab(tab.id).unwrap();
        self.remote.set_values(tab.id, &values).unwrap();
    }

    /// Assert that `path` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the remote tab `title` holds exactly `rows`.
    ///
    /// # Panics
    /// Panics if the tab is missing or its values differ.
    pub fn assert_tab_values(&self, title: &str, rows: &[&[&str]]) {
        let tab = self
            .tab(title)
            .unwrap_or_else(|| panic!("No remote tab titled '{}'", title));
        let actual = self.remote.get_values(tab.id).unwrap();
        let expected: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        assert_eq!(actual, expected, "Values of remote tab '{}'", title);
    }
}

//! Spreadsheet persisted as a JSON document on disk

use sheetsync_fs::{NormalizedPath, io};

use super::{DocumentStore, RemoteResult, SpreadsheetDocument};
use crate::error::RemoteError;
use crate::{Error, Result};

/// A spreadsheet stored in a JSON file.
///
/// Every call loads the document, applies the operation and, for mutating
/// calls, writes it back atomically.
#[derive(Debug, Clone)]
pub struct FileSpreadsheet {
    path: NormalizedPath,
}

impl FileSpreadsheet {
    /// Create a new spreadsheet document at `path` with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if a document already exists there.
    pub fn create(path: NormalizedPath, title: &str) -> Result<Self> {
        let document = SpreadsheetDocument::new(uuid::Uuid::new_v4().to_string(), title);
        Self::create_from(path, &document)
    }

    /// Write `document` to a new file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if a document already exists there.
    pub fn create_from(path: NormalizedPath, document: &SpreadsheetDocument) -> Result<Self> {
        if path.exists() {
            return Err(Error::conflict(format!("Spreadsheet {} already exists", path)));
        }
        let spreadsheet = Self { path };
        spreadsheet.save(document)?;
        tracing::info!(path = %spreadsheet.path, id = %document.id, "Created spreadsheet");
        Ok(spreadsheet)
    }

    /// Open an existing document.
    pub fn open(path: NormalizedPath) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("Spreadsheet {}", path)));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn load(&self) -> Result<SpreadsheetDocument> {
        let content = io::read_text(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, document: &SpreadsheetDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(document)?;
        io::write_text(&self.path, &content)?;
        Ok(())
    }
}

impl DocumentStore for FileSpreadsheet {
    fn read<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&SpreadsheetDocument) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let document = self
            .load()
            .map_err(|e| RemoteError::new(operation, e.to_string()))?;
        f(&document)
    }

    fn write<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut SpreadsheetDocument) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let mut document = self
            .load()
            .map_err(|e| RemoteError::new(operation, e.to_string()))?;
        let out = f(&mut document)?;
        self.save(&document)
            .map_err(|e| RemoteError::new(operation, e.to_string()))?;
        Ok(out)
    }

    fn discard(&self, operation: &str) -> RemoteResult<()> {
        match io::remove_if_exists(&self.path) {
            Ok(true) => {
                tracing::info!(path = %self.path, "Deleted spreadsheet");
                Ok(())
            }
            Ok(false) => Err(RemoteError::new(
                operation,
                format!("Spreadsheet {} does not exist", self.path),
            )),
            Err(e) => Err(RemoteError::new(operation, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Spreadsheet;
    use pretty_assertions::assert_eq;

    #[test]
    fn changes_persist_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("remote.json"));

        let remote = FileSpreadsheet::create(path.clone(), "Project").unwrap();
        let id = remote.create_tab("Genes", 500, 20).unwrap();
        remote
            .set_values(id, &[vec!["id".into(), "name".into()]])
            .unwrap();

        let reopened = FileSpreadsheet::open(path).unwrap();
        let titles: Vec<String> = reopened
            .list_tabs()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Sheet1", "Genes"]);
        assert_eq!(reopened.get_values(id).unwrap(), vec![vec!["id", "name"]]);
    }

    #[test]
    fn failed_operation_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("remote.json"));
        let remote = FileSpreadsheet::create(path, "Project").unwrap();
        let before = remote.load().unwrap();

        assert!(remote.delete_tab(0).is_err());
        assert_eq!(remote.load().unwrap(), before);
    }

    #[test]
    fn create_refuses_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("remote.json"));
        FileSpreadsheet::create(path.clone(), "Project").unwrap();
        assert!(matches!(
            FileSpreadsheet::create(path, "Again"),
            Err(Error::Conflict(_))
        ));
    }
}

//! Remote spreadsheet abstraction
//!
//! The sync orchestrators only talk to the remote through [`Spreadsheet`].
//! Two implementations ship: [`MemorySpreadsheet`], an in-process document
//! used by tests, and [`FileSpreadsheet`], the same document persisted as
//! JSON, used by the CLI.

mod document;
mod file;
mod memory;

pub use document::{DocumentStore, RemoteTab, SpreadsheetDocument};
pub use file::FileSpreadsheet;
pub use memory::MemorySpreadsheet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheetsync_table::{CellAddress, CellRange, Grid};

use crate::error::RemoteError;
use crate::validation::ValidationRule;

/// Result of a remote call
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Identity and layout of one remote tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: u64,
    pub title: String,
    pub frozen_rows: u32,
    pub frozen_cols: u32,
}

/// Attributes attached to one remote cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
}

impl CellMetadata {
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.note.is_none() && self.validation.is_none()
    }
}

/// Set (or, when `note` is empty, remove) the note on one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    pub tab: u64,
    pub cell: CellAddress,
    pub note: String,
}

/// Set (or, when `rule` is `None`, remove) the validation rule on a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationUpdate {
    pub tab: u64,
    pub range: CellRange,
    pub rule: Option<ValidationRule>,
}

/// Operations the sync engine needs from a remote spreadsheet.
///
/// Tabs are addressed by their stable numeric id. Batch calls are applied
/// all-or-nothing: an error means none of the updates in the batch landed.
pub trait Spreadsheet {
    /// Identifier of the spreadsheet as a whole.
    fn spreadsheet_id(&self) -> RemoteResult<String>;

    /// Every tab, in display order.
    fn list_tabs(&self) -> RemoteResult<Vec<TabInfo>>;

    /// The tab's values as a rectangular grid ending at the last non-empty
    /// row and column.
    fn get_values(&self, tab: u64) -> RemoteResult<Grid>;

    /// Write `values` starting at `A1`, growing the tab as needed.
    fn set_values(&self, tab: u64, values: &[Vec<String>]) -> RemoteResult<()>;

    /// Remove all values and cell attributes from the tab.
    fn clear_tab(&self, tab: u64) -> RemoteResult<()>;

    /// Add a tab and return its id. Titles must be unique.
    fn create_tab(&self, title: &str, rows: u32, cols: u32) -> RemoteResult<u64>;

    /// Remove a tab. The last remaining tab can never be deleted.
    fn delete_tab(&self, tab: u64) -> RemoteResult<()>;

    fn rename_tab(&self, tab: u64, title: &str) -> RemoteResult<()>;

    fn freeze(&self, tab: u64, rows: u32, cols: u32) -> RemoteResult<()>;

    /// Non-empty cell attributes of the tab in row-major order.
    fn get_cell_metadata(&self, tab: u64) -> RemoteResult<Vec<(CellAddress, CellMetadata)>>;

    fn batch_set_notes(&self, updates: &[NoteUpdate]) -> RemoteResult<()>;

    fn batch_set_validation(&self, updates: &[ValidationUpdate]) -> RemoteResult<()>;

    /// Apply each format object to every cell of its range.
    fn set_formats(&self, tab: u64, formats: &[(CellRange, Value)]) -> RemoteResult<()>;

    /// Delete the whole spreadsheet.
    fn delete_spreadsheet(&self) -> RemoteResult<()>;
}

/// Any store that can lend out a [`SpreadsheetDocument`] is a spreadsheet.
impl<S: DocumentStore> Spreadsheet for S {
    fn spreadsheet_id(&self) -> RemoteResult<String> {
        self.read("spreadsheet_id", |doc| Ok(doc.id.clone()))
    }

    fn list_tabs(&self) -> RemoteResult<Vec<TabInfo>> {
        self.read("list_tabs", |doc| Ok(doc.list_tabs()))
    }

    fn get_values(&self, tab: u64) -> RemoteResult<Grid> {
        self.read("get_values", |doc| doc.get_values(tab))
    }

    fn set_values(&self, tab: u64, values: &[Vec<String>]) -> RemoteResult<()> {
        self.write("set_values", |doc| doc.set_values(tab, values))
    }

    fn clear_tab(&self, tab: u64) -> RemoteResult<()> {
        self.write("clear_tab", |doc| doc.clear_tab(tab))
    }

    fn create_tab(&self, title: &str, rows: u32, cols: u32) -> RemoteResult<u64> {
        self.write("create_tab", |doc| doc.create_tab(title, rows, cols))
    }

    fn delete_tab(&self, tab: u64) -> RemoteResult<()> {
        self.write("delete_tab", |doc| doc.delete_tab(tab))
    }

    fn rename_tab(&self, tab: u64, title: &str) -> RemoteResult<()> {
        self.write("rename_tab", |doc| doc.rename_tab(tab, title))
    }

    fn freeze(&self, tab: u64, rows: u32, cols: u32) -> RemoteResult<()> {
        self.write("freeze", |doc| doc.freeze(tab, rows, cols))
    }

    fn get_cell_metadata(&self, tab: u64) -> RemoteResult<Vec<(CellAddress, CellMetadata)>> {
        self.read("get_cell_metadata", |doc| doc.cell_metadata(tab))
    }

    fn batch_set_notes(&self, updates: &[NoteUpdate]) -> RemoteResult<()> {
        self.write("batch_set_notes", |doc| doc.set_notes(updates))
    }

    fn batch_set_validation(&self, updates: &[ValidationUpdate]) -> RemoteResult<()> {
        self.write("batch_set_validation", |doc| doc.set_validation(updates))
    }

    fn set_formats(&self, tab: u64, formats: &[(CellRange, Value)]) -> RemoteResult<()> {
        self.write("set_formats", |doc| doc.set_formats(tab, formats))
    }

    fn delete_spreadsheet(&self) -> RemoteResult<()> {
        self.discard("delete_spreadsheet")
    }
}

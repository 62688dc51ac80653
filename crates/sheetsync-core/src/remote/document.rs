//! In-memory model of a remote spreadsheet

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheetsync_table::{CellAddress, CellRange, Grid};

use super::{CellMetadata, NoteUpdate, RemoteResult, TabInfo, ValidationUpdate};
use crate::error::RemoteError;

/// A spreadsheet: an id, a title and an ordered list of tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetDocument {
    pub id: String,
    pub title: String,
    next_tab_id: u64,
    pub tabs: Vec<RemoteTab>,
}

/// One tab of a [`SpreadsheetDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTab {
    pub id: u64,
    pub title: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub frozen_rows: u32,
    #[serde(default)]
    pub frozen_cols: u32,
    #[serde(default)]
    pub values: Grid,
    #[serde(default)]
    pub cells: BTreeMap<CellAddress, CellMetadata>,
}

/// Storage lending out a document for one call at a time.
///
/// `operation` names the [`Spreadsheet`](super::Spreadsheet) method being
/// served so failures can be attributed to it.
pub trait DocumentStore {
    fn read<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&SpreadsheetDocument) -> RemoteResult<T>,
    ) -> RemoteResult<T>;

    fn write<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut SpreadsheetDocument) -> RemoteResult<T>,
    ) -> RemoteResult<T>;

    /// Delete the document itself. Later calls fail.
    fn discard(&self, operation: &str) -> RemoteResult<()>;
}

const DEFAULT_ROWS: u32 = 1000;
const DEFAULT_COLS: u32 = 26;

impl SpreadsheetDocument {
    /// A new spreadsheet with the single default tab `Sheet1`.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            next_tab_id: 1,
            tabs: vec![RemoteTab::new(0, "Sheet1", DEFAULT_ROWS, DEFAULT_COLS)],
        }
    }

    pub fn tab(&self, id: u64) -> Option<&RemoteTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn tab_by_title(&self, title: &str) -> Option<&RemoteTab> {
        self.tabs.iter().find(|t| t.title == title)
    }

    fn existing(&self, operation: &str, id: u64) -> RemoteResult<&RemoteTab> {
        self.tab(id)
            .ok_or_else(|| RemoteError::new(operation, format!("No tab with id {}", id)))
    }

    fn existing_mut(&mut self, operation: &str, id: u64) -> RemoteResult<&mut RemoteTab> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| RemoteError::new(operation, format!("No tab with id {}", id)))
    }

    fn ensure_unique_title(&self, operation: &str, title: &str) -> RemoteResult<()> {
        if self.tab_by_title(title).is_some() {
            return Err(RemoteError::new(
                operation,
                format!("A sheet with the name \"{}\" already exists", title),
            ));
        }
        Ok(())
    }

    pub(crate) fn list_tabs(&self) -> Vec<TabInfo> {
        self.tabs
            .iter()
            .map(|t| TabInfo {
                id: t.id,
                title: t.title.clone(),
                frozen_rows: t.frozen_rows,
                frozen_cols: t.frozen_cols,
            })
            .collect()
    }

    pub(crate) fn get_values(&self, tab: u64) -> RemoteResult<Grid> {
        Ok(self.existing("get_values", tab)?.used_values())
    }

    pub(crate) fn set_values(&mut self, tab: u64, values: &[Vec<String>]) -> RemoteResult<()> {
        let tab = self.existing_mut("set_values", tab)?;
        for (r, row) in values.iter().enumerate() {
            if tab.values.len() <= r {
                tab.values.resize(r + 1, Vec::new());
            }
            let target = &mut tab.values[r];
            if target.len() < row.len() {
                target.resize(row.len(), String::new());
            }
            target[..row.len()].clone_from_slice(row);
        }
        let width = values.iter().map(Vec::len).max().unwrap_or(0) as u32;
        tab.rows = tab.rows.max(values.len() as u32);
        tab.cols = tab.cols.max(width);
        Ok(())
    }

    pub(crate) fn clear_tab(&mut self, tab: u64) -> RemoteResult<()> {
        let tab = self.existing_mut("clear_tab", tab)?;
        tab.values.clear();
        tab.cells.clear();
        Ok(())
    }

    pub(crate) fn create_tab(&mut self, title: &str, rows: u32, cols: u32) -> RemoteResult<u64> {
        self.ensure_unique_title("create_tab", title)?;
        let id = self.next_tab_id;
        self.next_tab_id += 1;
        self.tabs.push(RemoteTab::new(id, title, rows, cols));
        Ok(id)
    }

    pub(crate) fn delete_tab(&mut self, tab: u64) -> RemoteResult<()> {
        self.existing("delete_tab", tab)?;
        if self.tabs.len() == 1 {
            return Err(RemoteError::new(
                "delete_tab",
                "You can't remove all the sheets in a document",
            ));
        }
        self.tabs.retain(|t| t.id != tab);
        Ok(())
    }

    pub(crate) fn rename_tab(&mut self, tab: u64, title: &str) -> RemoteResult<()> {
        if self.existing("rename_tab", tab)?.title == title {
            return Ok(());
        }
        self.ensure_unique_title("rename_tab", title)?;
        self.existing_mut("rename_tab", tab)?.title = title.to_string();
        Ok(())
    }

    pub(crate) fn freeze(&mut self, tab: u64, rows: u32, cols: u32) -> RemoteResult<()> {
        let tab = self.existing_mut("freeze", tab)?;
        tab.frozen_rows = rows;
        tab.frozen_cols = cols;
        Ok(())
    }

    pub(crate) fn cell_metadata(&self, tab: u64) -> RemoteResult<Vec<(CellAddress, CellMetadata)>> {
        let tab = self.existing("get_cell_metadata", tab)?;
        Ok(tab
            .cells
            .iter()
            .filter(|(_, meta)| !meta.is_empty())
            .map(|(cell, meta)| (*cell, meta.clone()))
            .collect())
    }

    pub(crate) fn set_notes(&mut self, updates: &[NoteUpdate]) -> RemoteResult<()> {
        for update in updates {
            self.existing("batch_set_notes", update.tab)?;
        }
        for update in updates {
            let tab = self.existing_mut("batch_set_notes", update.tab)?;
            let note = (!update.note.is_empty()).then(|| update.note.clone());
            tab.update_cell(update.cell, |meta| meta.note = note);
        }
        Ok(())
    }

    pub(crate) fn set_validation(&mut self, updates: &[ValidationUpdate]) -> RemoteResult<()> {
        for update in updates {
            self.existing("batch_set_validation", update.tab)?;
        }
        for update in updates {
            let tab = self.existing_mut("batch_set_validation", update.tab)?;
            for cell in update.range.cells() {
                let rule = update.rule.clone();
                tab.update_cell(cell, |meta| meta.validation = rule);
            }
        }
        Ok(())
    }

    pub(crate) fn set_formats(&mut self, tab: u64, formats: &[(CellRange, Value)]) -> RemoteResult<()> {
        let tab = self.existing_mut("set_formats", tab)?;
        for (range, format) in formats {
            for cell in range.cells() {
                tab.update_cell(cell, |meta| meta.format = Some(format.clone()));
            }
        }
        Ok(())
    }
}

impl RemoteTab {
    fn new(id: u64, title: &str, rows: u32, cols: u32) -> Self {
        Self {
            id,
            title: title.to_string(),
            rows,
            cols,
            frozen_rows: 0,
            frozen_cols: 0,
            values: Grid::new(),
            cells: BTreeMap::new(),
        }
    }

    fn update_cell(&mut self, cell: CellAddress, f: impl FnOnce(&mut CellMetadata)) {
        let meta = self.cells.entry(cell).or_default();
        f(meta);
        if meta.is_empty() {
            self.cells.remove(&cell);
        }
    }

    /// Values cropped to the last non-empty row and column, padded to a
    /// rectangle.
    fn used_values(&self) -> Grid {
        let non_empty = |row: &Vec<String>| row.iter().rposition(|c| !c.is_empty());
        let height = self
            .values
            .iter()
            .rposition(|row| non_empty(row).is_some())
            .map_or(0, |r| r + 1);
        let width = self.values[..height]
            .iter()
            .filter_map(non_empty)
            .max()
            .map_or(0, |c| c + 1);

        self.values[..height]
            .iter()
            .map(|row| {
                let mut row: Vec<String> = row.iter().take(width).cloned().collect();
                row.resize(width, String::new());
                row
            })
            .collect()
    }
}

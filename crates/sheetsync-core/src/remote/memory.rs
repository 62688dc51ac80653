//! In-process spreadsheet for tests

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use super::{DocumentStore, RemoteResult, SpreadsheetDocument};
use crate::error::RemoteError;

/// A spreadsheet held in memory.
///
/// Clones share the same document, so a test can hand one clone to a
/// [`ProjectContext`](crate::ProjectContext) and inspect the remote state
/// through another.
#[derive(Debug, Clone)]
pub struct MemorySpreadsheet {
    document: Rc<RefCell<SpreadsheetDocument>>,
    failing: Rc<RefCell<HashSet<String>>>,
    deleted: Rc<Cell<bool>>,
}

impl MemorySpreadsheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self::from_document(SpreadsheetDocument::new(
            uuid::Uuid::new_v4().to_string(),
            title,
        ))
    }

    pub fn from_document(document: SpreadsheetDocument) -> Self {
        Self {
            document: Rc::new(RefCell::new(document)),
            failing: Rc::new(RefCell::new(HashSet::new())),
            deleted: Rc::new(Cell::new(false)),
        }
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> SpreadsheetDocument {
        self.document.borrow().clone()
    }

    /// Edit the document directly, as a collaborator would in the browser.
    pub fn edit<T>(&self, f: impl FnOnce(&mut SpreadsheetDocument) -> T) -> T {
        f(&mut self.document.borrow_mut())
    }

    /// Make every later call of `operation` fail.
    pub fn fail_operation(&self, operation: &str) {
        self.failing.borrow_mut().insert(operation.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.borrow_mut().clear();
    }

    /// Whether the spreadsheet has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    fn check(&self, operation: &str) -> RemoteResult<()> {
        if self.failing.borrow().contains(operation) {
            return Err(RemoteError::new(operation, "injected failure"));
        }
        if self.deleted.get() {
            return Err(RemoteError::new(operation, "spreadsheet was deleted"));
        }
        Ok(())
    }
}

impl DocumentStore for MemorySpreadsheet {
    fn read<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&SpreadsheetDocument) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        self.check(operation)?;
        f(&self.document.borrow())
    }

    fn write<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut SpreadsheetDocument) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        self.check(operation)?;
        f(&mut self.document.borrow_mut())
    }

    fn discard(&self, operation: &str) -> RemoteResult<()> {
        self.check(operation)?;
        self.deleted.set(true);
        Ok(())
    }
}

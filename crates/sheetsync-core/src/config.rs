//! Project configuration (`config.tsv`)
//!
//! A headerless two-column key/value table:
//!
//! ```text
//! Version         0.1.0
//! Spreadsheet ID  5f0c...
//! Title           Gene annotations
//! Remote          .sheetsync/remote.json
//! ```

use std::collections::HashMap;

use sheetsync_fs::NormalizedPath;

use crate::manifest::table;
use crate::{Error, Result};

const VERSION: &str = "Version";
const SPREADSHEET_ID: &str = "Spreadsheet ID";
const TITLE: &str = "Title";
const REMOTE: &str = "Remote";

/// Default location of the file-backed remote, relative to the project root.
pub const DEFAULT_REMOTE: &str = ".sheetsync/remote.json";

/// Typed contents of `config.tsv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub spreadsheet_id: String,
    pub title: String,
    /// Path of the spreadsheet document, relative to the project root
    /// unless absolute
    pub remote: Option<String>,
    /// Version of sheetsync that initialized the project
    pub version: Option<String>,
}

impl ProjectConfig {
    pub fn new(spreadsheet_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            title: title.into(),
            remote: None,
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    /// Parse `config.tsv`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file is missing or lacks a
    /// required key.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::config(format!("Project is missing {}", path)));
        }
        let mut values: HashMap<String, String> = HashMap::new();
        for row in table::read_raw(path)? {
            let mut cells = row.into_iter();
            let (Some(key), value) = (cells.next(), cells.next()) else {
                continue;
            };
            values.insert(key.trim().to_string(), value.unwrap_or_default());
        }

        let mut required = |key: &str| {
            values
                .remove(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::config(format!("{} does not contain '{}'", path, key)))
        };
        let spreadsheet_id = required(SPREADSHEET_ID)?;
        let title = required(TITLE)?;

        Ok(Self {
            spreadsheet_id,
            title,
            remote: values.remove(REMOTE).filter(|v| !v.is_empty()),
            version: values.remove(VERSION).filter(|v| !v.is_empty()),
        })
    }

    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        let mut rows = Vec::new();
        if let Some(version) = &self.version {
            rows.push(vec![VERSION.to_string(), version.clone()]);
        }
        rows.push(vec![SPREADSHEET_ID.to_string(), self.spreadsheet_id.clone()]);
        rows.push(vec![TITLE.to_string(), self.title.clone()]);
        if let Some(remote) = &self.remote {
            rows.push(vec![REMOTE.to_string(), remote.clone()]);
        }
        table::write_raw(path, &rows)
    }

    /// Remote document location resolved against the project root.
    pub fn remote_path(&self, root: &NormalizedPath) -> NormalizedPath {
        let remote = self.remote.as_deref().unwrap_or(DEFAULT_REMOTE);
        if std::path::Path::new(remote).is_absolute() {
            NormalizedPath::new(remote)
        } else {
            root.join(remote)
        }
    }
}

//! Manifest store
//!
//! The manifest is the set of tab-separated tables under `.sheetsync/` that
//! describe tracked sheets, fields and their cell attributes. It is the only
//! state carried between synchronizations; every table is rewritten wholesale
//! on update.

pub mod formats;
mod records;
pub mod table;

pub use formats::FormatRegistry;
pub use records::{
    AttributeRow, FIELD_HEADERS, FieldRecord, FormatRow, NoteRow, Origin, RenameRecord,
    SHEET_HEADERS, SheetRecord, ValidationRow,
};

use std::collections::{BTreeMap, HashSet};

use sheetsync_fs::{NormalizedPath, ProjectPath, io};

use crate::{Error, Result};

/// How [`ManifestStore::save_attributes`] combines new rows with the table on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Replace every row of each updated sheet, keep other sheets' rows
    Merge,
    /// Add rows after the existing ones, skipping exact duplicates
    Append,
    /// Discard the table's current contents
    Overwrite,
}

/// Every manifest table, loaded at once.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub sheets: Vec<SheetRecord>,
    pub fields: Vec<FieldRecord>,
    pub formats: Vec<FormatRow>,
    pub notes: Vec<NoteRow>,
    pub validations: Vec<ValidationRow>,
    pub renames: Vec<RenameRecord>,
}

impl Manifest {
    /// Tracked, non-ignored sheets.
    pub fn active_sheets(&self) -> impl Iterator<Item = &SheetRecord> {
        self.sheets.iter().filter(|s| !s.ignored)
    }

    pub fn sheet(&self, title: &str) -> Option<&SheetRecord> {
        self.sheets.iter().find(|s| s.title == title)
    }
}

/// Reads and writes the manifest tables of one project directory.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: NormalizedPath,
}

impl ManifestStore {
    /// Store rooted at the `.sheetsync` directory `project_dir`.
    pub fn new(project_dir: NormalizedPath) -> Self {
        Self { dir: project_dir }
    }

    pub fn dir(&self) -> &NormalizedPath {
        &self.dir
    }

    pub fn path(&self, which: ProjectPath) -> NormalizedPath {
        self.dir.join(which.as_str())
    }

    /// Check that every required table exists and is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing or empty table.
    pub fn validate(&self) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(Error::config(format!(
                "{} is not a sheetsync project directory",
                self.dir
            )));
        }
        for table in ProjectPath::required_tables() {
            let path = self.path(*table);
            if !path.is_file() {
                return Err(Error::config(format!("Project is missing {}", path)));
            }
            if io::read_text(&path)?.trim().is_empty() {
                return Err(Error::config(format!("{} is empty", path)));
            }
        }
        Ok(())
    }

    /// Load every table.
    pub fn load(&self) -> Result<Manifest> {
        self.validate()?;
        Ok(Manifest {
            sheets: self.sheets()?,
            fields: self.fields()?,
            formats: self.attributes()?,
            notes: self.attributes()?,
            validations: self.attributes()?,
            renames: self.renames()?,
        })
    }

    /// Tracked sheet records, checking title and path uniqueness.
    pub fn sheets(&self) -> Result<Vec<SheetRecord>> {
        let path = self.path(ProjectPath::Sheet);
        let records: Vec<SheetRecord> = table::read_rows(&path, &["Title", "Path"])?;

        let mut titles = HashSet::new();
        let mut paths = HashSet::new();
        for record in &records {
            if !record.ignored && !titles.insert(record.title.as_str()) {
                return Err(Error::config(format!(
                    "{} lists sheet '{}' more than once",
                    path, record.title
                )));
            }
            if !record.path.is_empty() && !paths.insert(record.path.as_str()) {
                return Err(Error::config(format!(
                    "{} lists path '{}' more than once",
                    path, record.path
                )));
            }
        }
        Ok(records)
    }

    /// Rewrite `sheet.tsv`, replacing records by title and dropping `removed`.
    ///
    /// Records on disk that are neither updated nor removed keep their place;
    /// new titles are appended.
    pub fn save_sheets(&self, records: &[SheetRecord], removed: &[String]) -> Result<()> {
        let mut merged: Vec<SheetRecord> = self
            .sheets()?
            .into_iter()
            .filter(|r| !removed.contains(&r.title))
            .collect();
        for record in records {
            match merged.iter_mut().find(|r| r.title == record.title) {
                Some(existing) => *existing = record.clone(),
                None => merged.push(record.clone()),
            }
        }
        self.replace_sheets(&merged)
    }

    /// Rewrite `sheet.tsv` with exactly `records`.
    pub fn replace_sheets(&self, records: &[SheetRecord]) -> Result<()> {
        table::write_rows(&self.path(ProjectPath::Sheet), SHEET_HEADERS, records)
    }

    pub fn fields(&self) -> Result<Vec<FieldRecord>> {
        table::read_rows(&self.path(ProjectPath::Field), &["Field"])
    }

    pub fn save_fields(&self, fields: &[FieldRecord]) -> Result<()> {
        table::write_rows(&self.path(ProjectPath::Field), FIELD_HEADERS, fields)
    }

    /// Rows of one attribute table.
    pub fn attributes<R: AttributeRow>(&self) -> Result<Vec<R>> {
        table::read_rows(&self.path(R::TABLE), &R::HEADERS[..2])
    }

    /// Update one attribute table.
    ///
    /// `updates` maps sheet titles to their new rows; rows whose title is in
    /// `removed` are dropped whatever the mode. Merging re-reads the table so
    /// that updates made by other operations to other sheets survive.
    pub fn save_attributes<R: AttributeRow>(
        &self,
        updates: &BTreeMap<String, Vec<R>>,
        removed: &[String],
        mode: SaveMode,
    ) -> Result<()> {
        let existing = match mode {
            SaveMode::Overwrite => Vec::new(),
            SaveMode::Merge | SaveMode::Append => self.attributes::<R>()?,
        };

        let mut rows: Vec<R> = existing
            .into_iter()
            .filter(|row| !removed.iter().any(|t| t == row.sheet_title()))
            .filter(|row| mode != SaveMode::Merge || !updates.contains_key(row.sheet_title()))
            .collect();
        for row in updates.values().flatten() {
            if removed.iter().any(|t| t == row.sheet_title()) {
                continue;
            }
            if mode == SaveMode::Append && rows.contains(row) {
                continue;
            }
            rows.push(row.clone());
        }

        tracing::debug!(table = %R::TABLE, rows = rows.len(), "Saving attribute table");
        table::write_rows(&self.path(R::TABLE), R::HEADERS, &rows)
    }

    /// Rewrite one attribute table with exactly `rows`.
    pub fn replace_attributes<R: AttributeRow>(&self, rows: &[R]) -> Result<()> {
        table::write_rows(&self.path(R::TABLE), R::HEADERS, rows)
    }

    /// Point every attribute row of sheet `old` at sheet `new`.
    pub fn rekey_attributes(&self, old: &str, new: &str) -> Result<()> {
        self.rekey::<FormatRow>(old, new)?;
        self.rekey::<NoteRow>(old, new)?;
        self.rekey::<ValidationRow>(old, new)
    }

    fn rekey<R: AttributeRow>(&self, old: &str, new: &str) -> Result<()> {
        let mut rows = self.attributes::<R>()?;
        let mut touched = false;
        for row in rows.iter_mut().filter(|r| r.sheet_title() == old) {
            row.set_sheet_title(new.to_string());
            touched = true;
        }
        if touched {
            self.replace_attributes(&rows)?;
        }
        Ok(())
    }

    /// Drop every attribute row belonging to `titles`.
    pub fn remove_attributes(&self, titles: &[String]) -> Result<()> {
        let none = BTreeMap::new();
        self.save_attributes::<FormatRow>(&none, titles, SaveMode::Merge)?;
        let none = BTreeMap::new();
        self.save_attributes::<NoteRow>(&none, titles, SaveMode::Merge)?;
        let none = BTreeMap::new();
        self.save_attributes::<ValidationRow>(&none, titles, SaveMode::Merge)
    }

    /// Pending renames; the table is optional and has no header row.
    pub fn renames(&self) -> Result<Vec<RenameRecord>> {
        let path = self.path(ProjectPath::Renamed);
        let mut renames = Vec::new();
        for (idx, row) in table::read_raw(&path)?.into_iter().enumerate() {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let [old_title, new_title, new_path, origin] = <[String; 4]>::try_from(row)
                .map_err(|row| {
                    Error::config(format!(
                        "{} line {}: expected 4 columns, found {}",
                        path,
                        idx + 1,
                        row.len()
                    ))
                })?;
            let origin = match origin.trim() {
                "local" => Origin::Local,
                "remote" => Origin::Remote,
                other => {
                    return Err(Error::config(format!(
                        "{} line {}: unknown rename origin '{}'",
                        path,
                        idx + 1,
                        other
                    )));
                }
            };
            renames.push(RenameRecord {
                old_title,
                new_title,
                new_path,
                origin,
            });
        }
        Ok(renames)
    }

    /// Rewrite `renamed.tsv`; an empty list removes the file.
    pub fn save_renames(&self, renames: &[RenameRecord]) -> Result<()> {
        if renames.is_empty() {
            return self.clear_renames();
        }
        let rows: Vec<Vec<String>> = renames
            .iter()
            .map(|r| {
                vec![
                    r.old_title.clone(),
                    r.new_title.clone(),
                    r.new_path.clone(),
                    r.origin.as_str().to_string(),
                ]
            })
            .collect();
        table::write_raw(&self.path(ProjectPath::Renamed), &rows)
    }

    pub fn clear_renames(&self) -> Result<()> {
        io::remove_if_exists(&self.path(ProjectPath::Renamed))?;
        Ok(())
    }

    pub fn format_registry(&self) -> Result<FormatRegistry> {
        FormatRegistry::load(&self.path(ProjectPath::FormatDefinitions))
    }

    pub fn save_format_registry(&self, registry: &FormatRegistry) -> Result<()> {
        registry.save(&self.path(ProjectPath::FormatDefinitions))
    }
}

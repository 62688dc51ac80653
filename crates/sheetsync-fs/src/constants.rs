//! Names of the files and directories that make up a project.

use std::path::Path;

/// Fixed locations inside a sheetsync project.
///
/// Everything except [`ProjectPath::ProjectDir`] is relative to the project
/// directory itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPath {
    /// The `.sheetsync` directory at the project root
    ProjectDir,
    /// Cached remote snapshots, one TSV per sheet
    CacheDir,
    /// Key/value project configuration
    Config,
    /// Tracked sheet records
    Sheet,
    /// Column definitions seen across tracked tables
    Field,
    /// Range-aggregated format ids per sheet
    Format,
    /// Shared format definitions keyed by numeric id
    FormatDefinitions,
    /// Cell notes per sheet
    Note,
    /// Range-aggregated data validation rules per sheet
    Validation,
    /// Pending renames
    Renamed,
    /// Advisory lock held by mutating commands
    Lock,
}

impl ProjectPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectDir => ".sheetsync",
            Self::CacheDir => "tracked",
            Self::Config => "config.tsv",
            Self::Sheet => "sheet.tsv",
            Self::Field => "field.tsv",
            Self::Format => "format.tsv",
            Self::FormatDefinitions => "formats.json",
            Self::Note => "note.tsv",
            Self::Validation => "validation.tsv",
            Self::Renamed => "renamed.tsv",
            Self::Lock => "lock",
        }
    }

    /// Tables that must exist and be non-empty in an initialized project.
    pub fn required_tables() -> &'static [ProjectPath] {
        &[
            Self::Config,
            Self::Sheet,
            Self::Field,
            Self::Format,
            Self::Note,
            Self::Validation,
        ]
    }
}

impl AsRef<Path> for ProjectPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

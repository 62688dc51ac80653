//! Typed rows of the manifest tables

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sheetsync_fs::ProjectPath;
use sheetsync_table::{CellAddress, CellRange};

use crate::validation::{ConditionKind, join_values, split_values};

pub const SHEET_HEADERS: &[&str] = &[
    "ID",
    "Title",
    "Path",
    "Description",
    "Frozen Rows",
    "Frozen Columns",
    "Ignore",
];
pub const FIELD_HEADERS: &[&str] = &["Field", "Label", "Datatype", "Description"];

/// One tracked sheet (`sheet.tsv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRecord {
    /// Remote tab id; empty until the sheet is first pushed
    #[serde(rename = "ID", with = "optional_id")]
    pub id: Option<u64>,
    #[serde(rename = "Title")]
    pub title: String,
    /// Local path, relative to the project root
    #[serde(rename = "Path", default)]
    pub path: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Frozen Rows", with = "count", default)]
    pub frozen_rows: u32,
    #[serde(rename = "Frozen Columns", with = "count", default)]
    pub frozen_cols: u32,
    /// Tracked but excluded from sync
    #[serde(rename = "Ignore", with = "flag", default)]
    pub ignored: bool,
}

impl SheetRecord {
    /// A new, never-pushed record.
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            path: path.into(),
            description: String::new(),
            frozen_rows: 0,
            frozen_cols: 0,
            ignored: false,
        }
    }

    /// Whether the sheet has ever been pushed.
    pub fn is_pushed(&self) -> bool {
        self.id.is_some()
    }
}

/// Column definition seen across tracked tables (`field.tsv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "Label", default)]
    pub label: String,
    #[serde(rename = "Datatype", default)]
    pub datatype: String,
    #[serde(rename = "Description", default)]
    pub description: String,
}

/// Range-aggregated format assignment (`format.tsv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRow {
    #[serde(rename = "Sheet Title")]
    pub sheet_title: String,
    #[serde(rename = "Cell")]
    pub cell: CellRange,
    #[serde(rename = "Format ID")]
    pub format_id: u32,
}

/// Note attached to a single cell (`note.tsv`).
///
/// Newlines are stored escaped as `\n` so each note occupies one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    #[serde(rename = "Sheet Title")]
    pub sheet_title: String,
    #[serde(rename = "Cell")]
    pub cell: CellAddress,
    #[serde(rename = "Note", with = "escaped")]
    pub note: String,
}

/// Range-aggregated data validation rule (`validation.tsv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRow {
    #[serde(rename = "Sheet Title")]
    pub sheet_title: String,
    #[serde(rename = "Range")]
    pub range: CellRange,
    #[serde(rename = "Condition")]
    pub condition: ConditionKind,
    /// Comma-space-joined, backslash-escaped value list
    #[serde(rename = "Value", default)]
    pub value: String,
}

impl ValidationRow {
    pub fn new(
        sheet_title: impl Into<String>,
        range: CellRange,
        condition: ConditionKind,
        values: &[String],
    ) -> Self {
        Self {
            sheet_title: sheet_title.into(),
            range,
            condition,
            value: join_values(values),
        }
    }

    /// The rule's values, unescaped.
    pub fn values(&self) -> Vec<String> {
        split_values(&self.value)
    }
}

/// Which side a pending rename was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    Remote,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Pending rename (`renamed.tsv`, no header row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub old_title: String,
    pub new_title: String,
    pub new_path: String,
    pub origin: Origin,
}

/// Rows of the attribute tables, all keyed by sheet title.
pub trait AttributeRow: Clone + PartialEq + Serialize + DeserializeOwned {
    /// Manifest table holding rows of this kind
    const TABLE: ProjectPath;
    /// Header row of that table
    const HEADERS: &'static [&'static str];

    fn sheet_title(&self) -> &str;
    fn set_sheet_title(&mut self, title: String);
}

macro_rules! attribute_row {
    ($($ty:ty => $table:ident [$($header:literal),+]);+ $(;)?) => {
        $(
            impl AttributeRow for $ty {
                const TABLE: ProjectPath = ProjectPath::$table;
                const HEADERS: &'static [&'static str] = &[$($header),+];

                fn sheet_title(&self) -> &str {
                    &self.sheet_title
                }

                fn set_sheet_title(&mut self, title: String) {
                    self.sheet_title = title;
                }
            }
        )+
    };
}

attribute_row! {
    FormatRow => Format ["Sheet Title", "Cell", "Format ID"];
    NoteRow => Note ["Sheet Title", "Cell", "Note"];
    ValidationRow => Validation ["Sheet Title", "Range", "Condition", "Value"];
}

/// Empty cell means "not pushed yet".
mod optional_id {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.collect_str(id),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

/// Empty cell reads as zero.
mod count {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// `True`/`False`, case-insensitive; empty is false.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected True or False, found '{}'",
                other
            ))),
        }
    }
}

mod escaped {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.replace('\\', "\\\\").replace('\n', "\\n"))
    }

    /// `\\` and `\n` are decoded; any other backslash is kept as written.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let mut note = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match (c, chars.peek()) {
                ('\\', Some('\\')) => {
                    chars.next();
                    note.push('\\');
                }
                ('\\', Some('n')) => {
                    chars.next();
                    note.push('\n');
                }
                _ => note.push(c),
            }
        }
        Ok(note)
    }
}

//! Drop attribute rows from sheets

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::context::ProjectContext;
use crate::manifest::{AttributeRow, FormatRow, ManifestStore, NoteRow, SaveMode, ValidationRow};
use crate::{Error, Result};

/// Which attribute tables to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    Formats,
    Notes,
    Validation,
    All,
}

impl ClearTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formats => "formats",
            Self::Notes => "notes",
            Self::Validation => "validation",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ClearTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClearTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "formats" => Ok(Self::Formats),
            "notes" => Ok(Self::Notes),
            "validation" => Ok(Self::Validation),
            "all" => Ok(Self::All),
            other => Err(Error::invalid_input(format!("Unknown keyword: {}", other))),
        }
    }
}

fn drop_rows<R: AttributeRow>(store: &ManifestStore, titles: &[String]) -> Result<()> {
    store.save_attributes::<R>(&BTreeMap::new(), titles, SaveMode::Merge)
}

/// Remove the `target` attributes of `titles`, or of every non-ignored
/// sheet when `titles` is empty. Ignored sheets are skipped with an error
/// logged. Returns the titles that were cleared.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming every title that is not part of
/// the project; nothing is cleared in that case.
pub fn clear(ctx: &ProjectContext, target: ClearTarget, titles: &[String]) -> Result<Vec<String>> {
    let store = ctx.store();
    let sheets = store.sheets()?;

    let untracked: Vec<&str> = titles
        .iter()
        .filter(|t| !sheets.iter().any(|s| &s.title == *t))
        .map(String::as_str)
        .collect();
    if !untracked.is_empty() {
        return Err(Error::invalid_input(format!(
            "The following sheet(s) are not part of this project: {}",
            untracked.join(", ")
        )));
    }

    let selected: Vec<String> = if titles.is_empty() {
        sheets
            .iter()
            .filter(|s| !s.ignored)
            .map(|s| s.title.clone())
            .collect()
    } else {
        titles
            .iter()
            .filter(|t| {
                let ignored = sheets.iter().any(|s| &s.title == *t && s.ignored);
                if ignored {
                    tracing::error!("Cannot clear from ignored sheet '{}' - this will be ignored", t);
                }
                !ignored
            })
            .cloned()
            .collect()
    };

    if matches!(target, ClearTarget::Formats | ClearTarget::All) {
        drop_rows::<FormatRow>(store, &selected)?;
    }
    if matches!(target, ClearTarget::Notes | ClearTarget::All) {
        drop_rows::<NoteRow>(store, &selected)?;
    }
    if matches!(target, ClearTarget::Validation | ClearTarget::All) {
        drop_rows::<ValidationRow>(store, &selected)?;
    }
    for title in &selected {
        tracing::info!("Removed all {} from '{}'", target, title);
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_parse_from_keywords() {
        for target in [
            ClearTarget::Formats,
            ClearTarget::Notes,
            ClearTarget::Validation,
            ClearTarget::All,
        ] {
            assert_eq!(target.as_str().parse::<ClearTarget>().unwrap(), target);
        }
        assert!(matches!(
            "colors".parse::<ClearTarget>(),
            Err(Error::InvalidInput(_))
        ));
    }
}

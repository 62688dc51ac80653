//! Data validation rule types and eager checks on user-supplied rules

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sheetsync_table::CellRange;

use crate::{Error, Result};

/// `A1` or `A1:B2`, upper-case column letters, no `$` markers.
static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]+[0-9]+(:[A-Z]+[0-9]+)?$").expect("range pattern is a valid regex")
});

/// Condition types a validation rule can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionKind {
    NumberGreater,
    NumberGreaterThanEq,
    NumberLess,
    NumberLessThanEq,
    NumberEq,
    NumberNotEq,
    NumberBetween,
    NumberNotBetween,
    TextContains,
    TextNotContains,
    TextStartsWith,
    TextEndsWith,
    TextEq,
    TextIsEmail,
    TextIsUrl,
    DateEq,
    DateBefore,
    DateAfter,
    DateOnOrBefore,
    DateOnOrAfter,
    DateBetween,
    DateNotBetween,
    DateIsValid,
    OneOfRange,
    OneOfList,
    Blank,
    NotBlank,
    CustomFormula,
    Boolean,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 29] = [
        Self::NumberGreater,
        Self::NumberGreaterThanEq,
        Self::NumberLess,
        Self::NumberLessThanEq,
        Self::NumberEq,
        Self::NumberNotEq,
        Self::NumberBetween,
        Self::NumberNotBetween,
        Self::TextContains,
        Self::TextNotContains,
        Self::TextStartsWith,
        Self::TextEndsWith,
        Self::TextEq,
        Self::TextIsEmail,
        Self::TextIsUrl,
        Self::DateEq,
        Self::DateBefore,
        Self::DateAfter,
        Self::DateOnOrBefore,
        Self::DateOnOrAfter,
        Self::DateBetween,
        Self::DateNotBetween,
        Self::DateIsValid,
        Self::OneOfRange,
        Self::OneOfList,
        Self::Blank,
        Self::NotBlank,
        Self::CustomFormula,
        Self::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumberGreater => "NUMBER_GREATER",
            Self::NumberGreaterThanEq => "NUMBER_GREATER_THAN_EQ",
            Self::NumberLess => "NUMBER_LESS",
            Self::NumberLessThanEq => "NUMBER_LESS_THAN_EQ",
            Self::NumberEq => "NUMBER_EQ",
            Self::NumberNotEq => "NUMBER_NOT_EQ",
            Self::NumberBetween => "NUMBER_BETWEEN",
            Self::NumberNotBetween => "NUMBER_NOT_BETWEEN",
            Self::TextContains => "TEXT_CONTAINS",
            Self::TextNotContains => "TEXT_NOT_CONTAINS",
            Self::TextStartsWith => "TEXT_STARTS_WITH",
            Self::TextEndsWith => "TEXT_ENDS_WITH",
            Self::TextEq => "TEXT_EQ",
            Self::TextIsEmail => "TEXT_IS_EMAIL",
            Self::TextIsUrl => "TEXT_IS_URL",
            Self::DateEq => "DATE_EQ",
            Self::DateBefore => "DATE_BEFORE",
            Self::DateAfter => "DATE_AFTER",
            Self::DateOnOrBefore => "DATE_ON_OR_BEFORE",
            Self::DateOnOrAfter => "DATE_ON_OR_AFTER",
            Self::DateBetween => "DATE_BETWEEN",
            Self::DateNotBetween => "DATE_NOT_BETWEEN",
            Self::DateIsValid => "DATE_IS_VALID",
            Self::OneOfRange => "ONE_OF_RANGE",
            Self::OneOfList => "ONE_OF_LIST",
            Self::Blank => "BLANK",
            Self::NotBlank => "NOT_BLANK",
            Self::CustomFormula => "CUSTOM_FORMULA",
            Self::Boolean => "BOOLEAN",
        }
    }

    /// Inclusive bounds on how many values the condition takes.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Self::NumberBetween | Self::NumberNotBetween | Self::DateBetween | Self::DateNotBetween => (2, 2),
            Self::TextIsEmail | Self::TextIsUrl | Self::DateIsValid | Self::Blank | Self::NotBlank => (0, 0),
            Self::OneOfList => (1, usize::MAX),
            Self::Boolean => (0, 2),
            _ => (1, 1),
        }
    }

    /// Whether the remote should show a dropdown for this condition.
    pub fn shows_dropdown(&self) -> bool {
        matches!(self, Self::OneOfList | Self::OneOfRange)
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Error::invalid_input(format!("'{}' is not a valid condition type", s.trim())))
    }
}

/// A validation condition plus its ordered values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidationRule {
    pub condition: ConditionKind,
    pub values: Vec<String>,
}

/// Stored form of a list holding one empty value, which would otherwise
/// read back as no values at all. [`join_values`] never escapes a quote, so
/// no other list produces it.
const SINGLE_EMPTY_VALUE: &str = "\\\"\\\"";

/// Split a stored value list on unescaped `", "` and drop the escapes.
pub fn split_values(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    if raw == SINGLE_EMPTY_VALUE {
        return vec![String::new()];
    }
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                } else {
                    current.push('\\');
                }
            }
            ',' if chars.peek() == Some(&' ') => {
                chars.next();
                values.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    values.push(current);
    values
}

/// Join values with `", "`, escaping backslashes and commas inside values.
pub fn join_values(values: &[String]) -> String {
    if let [only] = values
        && only.is_empty()
    {
        return SINGLE_EMPTY_VALUE.to_string();
    }
    values
        .iter()
        .map(|v| v.replace('\\', "\\\\").replace(',', "\\,"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and check a user-supplied rule (range syntax, condition type, value
/// count).
pub fn check_rule(range: &str, condition: &str, value: &str) -> Result<(CellRange, ValidationRule)> {
    let range_text = range.trim();
    if !RANGE_PATTERN.is_match(range_text) {
        return Err(Error::invalid_input(format!("'{}' is not a valid range", range_text)));
    }
    let range = CellRange::parse(range_text)
        .map_err(|_| Error::invalid_input(format!("'{}' is not a valid range", range_text)))?;

    let condition: ConditionKind = condition.parse()?;
    let values = split_values(value.trim());
    let (min, max) = condition.arity();
    if values.len() < min || values.len() > max {
        return Err(if values.is_empty() {
            Error::invalid_input(format!(
                "A value or values is required for condition type '{}'",
                condition
            ))
        } else {
            Error::invalid_input(format!(
                "'{}' has inappropriate length/content for condition type '{}'",
                value.trim(),
                condition
            ))
        });
    }

    Ok((range, ValidationRule { condition, values }))
}

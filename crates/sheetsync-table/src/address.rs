//! A1-style cell addresses and ranges

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A single cell location such as `B7`.
///
/// Rows and columns are 0-based internally and 1-based / lettered in A1
/// form. The derived ordering is row-major: every cell of row 1 sorts before
/// any cell of row 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based, A = 0)
    pub col: u32,
}

impl CellAddress {
    /// Create an address from 0-based row and column indices.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style address (`A1`, `ab12`). `$` markers are not accepted.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| Error::InvalidAddress(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidAddress(s.to_string()));
        }

        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidAddress(s.to_string()))?;
        if row == 0 {
            return Err(Error::InvalidAddress(s.to_string()));
        }
        let col = letters_to_column(letters).ok_or_else(|| Error::InvalidAddress(s.to_string()))?;

        Ok(Self { row: row - 1, col })
    }

    /// The cell directly to the right.
    pub fn right(&self) -> Self {
        Self::new(self.row, self.col + 1)
    }

    /// The cell directly below.
    pub fn below(&self) -> Self {
        Self::new(self.row + 1, self.col)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CellAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Convert column index to letters (0 = A, 25 = Z, 26 = AA).
pub fn column_to_letters(col: u32) -> String {
    let mut result = Vec::new();
    let mut n = col as u64 + 1;
    while n > 0 {
        n -= 1;
        result.push((n % 26) as u8 + b'A');
        n /= 26;
    }
    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}

/// Convert column letters to a 0-based index; `None` on overflow or bad input.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    col.checked_sub(1)
}

/// A rectangular block of cells, `A1` or `A1:C4`.
///
/// A single-cell range displays without a colon, matching how ranges are
/// stored in the manifest's attribute tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// A range covering the rectangle between two corners.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] when `end` lies above or left of `start`.
    pub fn new(start: CellAddress, end: CellAddress) -> Result<Self> {
        if end.row < start.row || end.col < start.col {
            return Err(Error::InvalidRange(format!("{}:{}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// A range holding exactly one cell.
    pub fn single(cell: CellAddress) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Parse `A1` or `A1:B2`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((start, end)) => {
                let start =
                    CellAddress::parse(start).map_err(|_| Error::InvalidRange(s.to_string()))?;
                let end = CellAddress::parse(end).map_err(|_| Error::InvalidRange(s.to_string()))?;
                Self::new(start, end).map_err(|_| Error::InvalidRange(s.to_string()))
            }
            None => CellAddress::parse(s)
                .map(Self::single)
                .map_err(|_| Error::InvalidRange(s.to_string())),
        }
    }

    /// True when the range covers one cell.
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of cells covered.
    pub fn len(&self) -> usize {
        let rows = (self.end.row - self.start.row + 1) as usize;
        let cols = (self.end.col - self.start.col + 1) as usize;
        rows * cols
    }

    /// Ranges are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `cell` lies inside the range.
    pub fn contains(&self, cell: &CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Every cell in the range, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellAddress::new(row, col))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CellRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl From<CellAddress> for CellRange {
    fn from(cell: CellAddress) -> Self {
        Self::single(cell)
    }
}

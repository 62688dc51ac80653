//! Tab-separated manifest table I/O

use serde::Serialize;
use serde::de::DeserializeOwned;
use sheetsync_fs::{NormalizedPath, io};

use crate::{Error, Result};

fn reader(content: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(content.as_bytes())
}

/// Read a table with a header row, checking that `required` columns exist.
///
/// A missing or zero-length file is a configuration error: every table of
/// an initialized project has at least its header row.
pub fn read_rows<T: DeserializeOwned>(path: &NormalizedPath, required: &[&str]) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(Error::config(format!("Project is missing {}", path)));
    }
    let content = io::read_text(path)?;
    if content.is_empty() {
        return Err(Error::config(format!("{} is empty", path)));
    }

    let mut reader = reader(&content, true);
    let headers = reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(Error::config(format!("{} has no '{}' column", path, column)));
        }
    }

    let mut rows = Vec::new();
    for (line, row) in reader.deserialize().enumerate() {
        let row: T = row.map_err(|e| {
            Error::config(format!("{} line {}: {}", path, line + 2, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write a table with a header row, atomically replacing the file.
pub fn write_rows<T: Serialize>(path: &NormalizedPath, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    io::write_atomic(path, &bytes)?;
    Ok(())
}

/// Read a headerless table as raw string rows. A missing file has no rows.
pub fn read_raw(path: &NormalizedPath) -> Result<Vec<Vec<String>>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let content = io::read_text(path)?;
    let mut rows = Vec::new();
    for record in reader(&content, false).records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Write a headerless table of raw string rows.
pub fn write_raw(path: &NormalizedPath, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    io::write_atomic(path, &bytes)?;
    Ok(())
}

//! Reading and writing delimited tables as string grids

use std::io::{Read, Write};

use sheetsync_fs::{NormalizedPath, io};

use crate::Result;

/// A table as rows of cell text. The first row is the header when present.
pub type Grid = Vec<Vec<String>>;

/// Field delimiter for a path: comma for `.csv`, tab otherwise.
pub fn delimiter_for(path: &NormalizedPath) -> u8 {
    if path.is_csv() { b',' } else { b'\t' }
}

/// Parse delimited text into a grid. Rows may have differing lengths.
pub fn parse_grid<R: Read>(reader: R, delimiter: u8) -> Result<Grid> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid = Grid::new();
    for record in csv_reader.records() {
        let record = record?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

/// Serialize a grid as delimited text with `\n` line endings.
pub fn format_grid(grid: &[Vec<String>], delimiter: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_grid_to(&mut buffer, grid, delimiter)?;
    Ok(buffer)
}

fn write_grid_to<W: Write>(writer: W, grid: &[Vec<String>], delimiter: u8) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(writer);
    for row in grid {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read a TSV or CSV file, choosing the delimiter from the extension.
pub fn read_grid(path: &NormalizedPath) -> Result<Grid> {
    let content = io::read_text(path)?;
    parse_grid(content.as_bytes(), delimiter_for(path))
}

/// Atomically write a grid to a TSV or CSV file, choosing the delimiter from
/// the extension.
pub fn write_grid(path: &NormalizedPath, grid: &[Vec<String>]) -> Result<()> {
    let bytes = format_grid(grid, delimiter_for(path))?;
    io::write_atomic(path, &bytes)?;
    Ok(())
}

/// Re-encode a table from one file into another, converting between TSV and
/// CSV as the two extensions require.
pub fn convert_file(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    tracing::debug!(from = %from, to = %to, "Converting table");
    if delimiter_for(from) == delimiter_for(to) {
        io::copy_file(from, to)?;
        return Ok(());
    }
    let grid = read_grid(from)?;
    write_grid(to, &grid)
}

/// Pad every row with empty cells up to the width of the header row.
///
/// Remote sheets drop trailing empty cells, so two copies of the same table
/// only compare equal once both are padded.
pub fn pad_to_header(grid: &mut Grid) {
    let Some(width) = grid.first().map(Vec::len) else {
        return;
    };
    for row in grid.iter_mut().skip(1) {
        if row.len() < width {
            row.resize(width, String::new());
        }
    }
}

/// Width of the widest row.
pub fn max_width(grid: &[Vec<String>]) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn parse_tsv_with_ragged_rows() {
        let parsed = parse_grid("id\tname\tnote\n1\tBRCA1\n".as_bytes(), b'\t').unwrap();
        assert_eq!(parsed, grid(&[&["id", "name", "note"], &["1", "BRCA1"]]));
    }

    #[test]
    fn format_quotes_embedded_delimiters() {
        let bytes = format_grid(&grid(&[&["a,b", "c"]]), b',').unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "\"a,b\",c\n");
    }

    #[test]
    fn pad_to_header_fills_short_rows() {
        let mut g = grid(&[&["id", "name", "note"], &["1"], &["2", "x", "y"]]);
        pad_to_header(&mut g);
        assert_eq!(g[1], vec!["1", "", ""]);
        assert_eq!(g[2].len(), 3);
    }

    #[test]
    fn convert_tsv_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let from = NormalizedPath::new(dir.path().join("genes.tsv"));
        let to = NormalizedPath::new(dir.path().join("genes.csv"));
        std::fs::write(from.to_native(), "id\tname\n1\tBRCA1, BRCA2\n").unwrap();

        convert_file(&from, &to).unwrap();

        let written = std::fs::read_to_string(to.to_native()).unwrap();
        assert_eq!(written, "id,name\n1,\"BRCA1, BRCA2\"\n");
    }
}

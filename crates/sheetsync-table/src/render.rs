//! Column-aligned text rendering of a table diff

use crate::diff::DiffTag;

/// How a rendered line should be highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Separator,
    Added,
    Removed,
    Changed,
    Omitted,
    Context,
}

/// One line of rendered diff output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub kind: LineKind,
    pub text: String,
}

/// Lay out diff rows as aligned columns.
///
/// The tag column is blank in the header. When the diff carries a schema
/// row, the header spans two lines: column add/remove markers, then names.
/// A dashed separator follows the header.
pub fn render_diff(rows: &[Vec<String>]) -> Vec<RenderedLine> {
    if rows.is_empty() {
        return Vec::new();
    }

    let header_len = if DiffTag::of_row(&rows[0]) == DiffTag::Schema {
        2.min(rows.len())
    } else {
        1
    };

    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; cols];
    for (i, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let shown = if i < header_len && c == 0 && i == header_len - 1 {
                ""
            } else {
                cell.as_str()
            };
            widths[c] = widths[c].max(shown.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        let is_header = i < header_len;
        let cells: Vec<&str> = (0..cols)
            .map(|c| {
                let cell = row.get(c).map(String::as_str).unwrap_or("");
                // The `@@` marker is implied by the header position
                if is_header && c == 0 && i == header_len - 1 {
                    ""
                } else {
                    cell
                }
            })
            .collect();

        let kind = if is_header {
            LineKind::Header
        } else {
            match DiffTag::of_row(row) {
                DiffTag::Added => LineKind::Added,
                DiffTag::Removed => LineKind::Removed,
                DiffTag::Changed => LineKind::Changed,
                DiffTag::Omitted => LineKind::Omitted,
                _ => LineKind::Context,
            }
        };
        lines.push(RenderedLine {
            kind,
            text: join_padded(&cells, &widths),
        });

        if i + 1 == header_len {
            let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            let dashes: Vec<&str> = dashes.iter().map(String::as_str).collect();
            lines.push(RenderedLine {
                kind: LineKind::Separator,
                text: join_padded(&dashes, &widths),
            });
        }
    }
    lines
}

fn join_padded(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    padded.join("  ").trim_end().to_string()
}

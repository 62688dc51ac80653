//! Range aggregation of per-cell attributes
//!
//! Remote metadata arrives one cell at a time. Stored and pushed, it is a
//! short list of `(range, value)` pairs: a greedy single pass over the cells
//! in scan order that extends the open run while the value repeats and the
//! cell continues the run.
//!
//! Runs are one-dimensional. A run grows to the right along a row or
//! downwards along a column, decided by its second cell; a cell that matches
//! the value but does not continue the run starts a new one. Two equal cells
//! that are adjacent on the sheet but not consecutive in scan order are never
//! merged, so expanding the result always reproduces the input exactly.

use std::collections::HashMap;
use std::hash::Hash;

use sheetsync_table::{CellAddress, CellRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

struct Run<V> {
    start: CellAddress,
    end: CellAddress,
    axis: Option<Axis>,
    value: V,
}

impl<V: PartialEq> Run<V> {
    /// Grow the run to `cell` if it carries the same value and continues it.
    fn try_extend(&mut self, cell: CellAddress, value: &V) -> bool {
        if *value != self.value {
            return false;
        }
        let axis = match self.axis {
            Some(Axis::Row) if cell == self.end.right() => Axis::Row,
            Some(Axis::Column) if cell == self.end.below() => Axis::Column,
            None if cell == self.end.right() => Axis::Row,
            None if cell == self.end.below() => Axis::Column,
            _ => return false,
        };
        self.axis = Some(axis);
        self.end = cell;
        true
    }

    fn into_pair(self) -> (CellRange, V) {
        (
            CellRange {
                start: self.start,
                end: self.end,
            },
            self.value,
        )
    }
}

/// Compress cells visited in scan order into `(range, value)` pairs.
///
/// A `None` value marks an empty cell and closes the open run.
///
/// # Example
///
/// ```
/// use sheetsync_core::aggregate::aggregate_runs;
/// use sheetsync_table::CellAddress;
///
/// let cell = |a: &str| CellAddress::parse(a).unwrap();
/// let runs = aggregate_runs([
///     (cell("A1"), Some("x")),
///     (cell("A2"), Some("x")),
///     (cell("A3"), Some("y")),
///     (cell("B1"), Some("x")),
/// ]);
/// let labels: Vec<String> = runs.iter().map(|(r, v)| format!("{r}={v}")).collect();
/// assert_eq!(labels, ["A1:A2=x", "A3=y", "B1=x"]);
/// ```
pub fn aggregate_runs<V, I>(cells: I) -> Vec<(CellRange, V)>
where
    V: PartialEq,
    I: IntoIterator<Item = (CellAddress, Option<V>)>,
{
    let mut out = Vec::new();
    let mut open: Option<Run<V>> = None;

    for (cell, value) in cells {
        let Some(value) = value else {
            if let Some(run) = open.take() {
                out.push(run.into_pair());
            }
            continue;
        };
        if let Some(run) = open.as_mut()
            && run.try_extend(cell, &value)
        {
            continue;
        }
        if let Some(run) = open.take() {
            out.push(run.into_pair());
        }
        open = Some(Run {
            start: cell,
            end: cell,
            axis: None,
            value,
        });
    }

    if let Some(run) = open {
        out.push(run.into_pair());
    }
    out
}

/// Group cells by value, sort each group and aggregate it.
///
/// Used for validation rules, where one rule typically covers cells spread
/// over the sheet. Groups are emitted in the order their value was first
/// seen.
pub fn aggregate_grouped<V, I>(cells: I) -> Vec<(CellRange, V)>
where
    V: Eq + Hash + Clone,
    I: IntoIterator<Item = (CellAddress, V)>,
{
    let mut order: Vec<V> = Vec::new();
    let mut groups: HashMap<V, Vec<CellAddress>> = HashMap::new();
    for (cell, value) in cells {
        groups
            .entry(value.clone())
            .or_insert_with(|| {
                order.push(value.clone());
                Vec::new()
            })
            .push(cell);
    }

    let mut out = Vec::new();
    for value in order {
        let Some(mut group) = groups.remove(&value) else {
            continue;
        };
        group.sort();
        group.dedup();
        out.extend(aggregate_runs(
            group.into_iter().map(|cell| (cell, Some(value.clone()))),
        ));
    }
    out
}

/// Expand `(range, value)` pairs back into per-cell form.
pub fn expand<'a, V: Clone + 'a>(
    ranges: impl IntoIterator<Item = &'a (CellRange, V)>,
) -> Vec<(CellAddress, V)> {
    ranges
        .into_iter()
        .flat_map(|(range, value)| range.cells().map(move |cell| (cell, value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(a1: &str) -> CellAddress {
        CellAddress::parse(a1).unwrap()
    }

    fn labels<V: std::fmt::Display>(runs: &[(CellRange, V)]) -> Vec<String> {
        runs.iter().map(|(r, v)| format!("{}={}", r, v)).collect()
    }

    #[test]
    fn scan_order_neighbours_only() {
        let runs = aggregate_runs([
            (cell("A1"), Some(1)),
            (cell("A2"), Some(1)),
            (cell("A3"), Some(2)),
            (cell("B1"), Some(1)),
        ]);
        assert_eq!(labels(&runs), vec!["A1:A2=1", "A3=2", "B1=1"]);
    }

    #[test]
    fn row_runs_extend_right() {
        let runs = aggregate_runs([
            (cell("A1"), Some("f")),
            (cell("B1"), Some("f")),
            (cell("C1"), Some("f")),
            (cell("A2"), Some("f")),
        ]);
        assert_eq!(labels(&runs), vec!["A1:C1=f", "A2=f"]);
    }

    #[test]
    fn empty_cell_breaks_a_run() {
        let runs = aggregate_runs([
            (cell("A1"), Some(5)),
            (cell("B1"), None),
            (cell("C1"), Some(5)),
            (cell("D1"), Some(5)),
        ]);
        assert_eq!(labels(&runs), vec!["A1=5", "C1:D1=5"]);
    }

    #[test]
    fn gap_in_scan_order_breaks_a_run() {
        let runs = aggregate_runs([(cell("A1"), Some(0)), (cell("C1"), Some(0))]);
        assert_eq!(labels(&runs), vec!["A1=0", "C1=0"]);
    }

    #[test]
    fn isolated_cell_stays_single() {
        let runs = aggregate_runs([
            (cell("A1"), Some('a')),
            (cell("B1"), Some('b')),
            (cell("C1"), Some('a')),
        ]);
        assert_eq!(labels(&runs), vec!["A1=a", "B1=b", "C1=a"]);
        assert!(runs.iter().all(|(r, _)| r.is_single()));
    }

    #[test]
    fn grouped_cells_are_sorted_before_aggregation() {
        let runs = aggregate_grouped([
            (cell("A3"), "rule"),
            (cell("B1"), "other"),
            (cell("A1"), "rule"),
            (cell("A2"), "rule"),
        ]);
        // sorted row-major: A1, A2, A3 are consecutive in one column
        assert_eq!(labels(&runs), vec!["A1:A3=rule", "B1=other"]);
    }

    #[test]
    fn expand_reverses_aggregation() {
        let input = vec![
            (cell("A1"), 1),
            (cell("B1"), 1),
            (cell("C1"), 2),
            (cell("A2"), 2),
        ];
        let runs = aggregate_runs(input.iter().map(|(c, v)| (*c, Some(*v))));
        assert_eq!(expand(&runs), input);
    }

    #[test]
    fn nothing_in_nothing_out() {
        let runs: Vec<(CellRange, u32)> = aggregate_runs(std::iter::empty());
        assert!(runs.is_empty());
        assert!(expand(&runs).is_empty());
    }
}

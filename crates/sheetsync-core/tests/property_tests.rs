//! Properties of range aggregation

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use sheetsync_core::aggregate::{aggregate_grouped, aggregate_runs, expand};
use sheetsync_table::CellAddress;

/// Sparse sheets: up to 40 cells in a 10x10 area, few distinct values.
fn sheet() -> impl Strategy<Value = BTreeMap<(u32, u32), u8>> {
    prop::collection::btree_map((0u32..10, 0u32..10), 0u8..3, 0..40)
}

fn cells(sheet: &BTreeMap<(u32, u32), u8>) -> Vec<(CellAddress, u8)> {
    sheet
        .iter()
        .map(|(&(row, col), &v)| (CellAddress::new(row, col), v))
        .collect()
}

proptest! {
    #[test]
    fn runs_expand_to_the_scanned_cells(sheet in sheet()) {
        let input = cells(&sheet);
        let runs = aggregate_runs(input.iter().map(|(c, v)| (*c, Some(*v))));
        prop_assert_eq!(expand(&runs), input);
    }

    #[test]
    fn runs_never_outnumber_cells(sheet in sheet()) {
        let input = cells(&sheet);
        let runs = aggregate_runs(input.iter().map(|(c, v)| (*c, Some(*v))));
        prop_assert!(runs.len() <= input.len());
        prop_assert!(runs.iter().all(|(range, _)| !range.is_empty()));
    }

    #[test]
    fn grouped_runs_cover_the_same_cells(sheet in sheet()) {
        let input: BTreeSet<(CellAddress, u8)> = cells(&sheet).into_iter().collect();
        let runs = aggregate_grouped(input.iter().rev().copied());
        let output: BTreeSet<(CellAddress, u8)> = expand(&runs).into_iter().collect();
        prop_assert_eq!(output, input);
    }

    #[test]
    fn empty_cells_split_runs(len in 2u32..12, gap in 1u32..11) {
        prop_assume!(gap < len - 1);
        let row = (0..len).map(|col| {
            let value = if col == gap { None } else { Some('x') };
            (CellAddress::new(0, col), value)
        });
        let runs = aggregate_runs(row);
        prop_assert_eq!(runs.len(), 2);
        prop_assert_eq!(runs[0].0.end, CellAddress::new(0, gap - 1));
        prop_assert_eq!(runs[1].0.start, CellAddress::new(0, gap + 1));
    }
}

//! Distinct-value scan over a single column, used to populate the slot and
//! port dropdowns before a search is performed. Assumes the fixed physical
//! layout of the source sheets: column A = OLT, B = Slot, C = Port.

use crate::grid::Grid;
use indexmap::IndexSet;

pub const SLOT_COLUMN: usize = 1;
pub const PORT_COLUMN: usize = 2;

/// Placeholder rows carry "_" in place of a real value and are skipped.
const PLACEHOLDER: &str = "_";

/// Collect the distinct values of one column across all data rows, carrying
/// the current value forward over merged-cell gaps, then sort ascending by
/// integer parse (non-numeric values parse to 0 and sort together first).
pub fn distinct_column_values(grid: &Grid, column: usize) -> Vec<String> {
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut current = String::new();

    for row in 1..grid.row_count() {
        let cell = grid.cell(row, column).trim();
        if !cell.is_empty() {
            current = cell.to_string();
        }
        if !current.is_empty() && current != PLACEHOLDER {
            seen.insert(current.clone());
        }
    }

    let mut values: Vec<String> = seen.into_iter().collect();
    values.sort_by_key(|v| v.parse::<i64>().unwrap_or(0));
    values
}

//! Row alignment between two grids.
//!
//! Rows are paired by a longest-common-subsequence over the rows of both
//! grids, where two rows match when they are *similar*: at least 70% of their
//! non-empty cells carry the same normalized formula. Comparator rows left
//! unpaired are insertions, reference rows left unpaired are deletions.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

use cellscope_formulas::{is_a_formula, normalize_formula};
use cellscope_primitives::CellAddress;
use cellscope_sheet::SheetGrid;

/// Largest row count per side that is aligned; beyond it only the positional
/// comparison is produced.
pub const MAX_ALIGNMENT_ROWS: usize = 5_000;

/// Absolute row numbers on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAlignment {
    /// `(reference_row, comparator_row)` pairs in ascending order
    pub matched: Vec<(u32, u32)>,
    /// Comparator rows with no counterpart
    pub inserted: Vec<u32>,
    /// Reference rows with no counterpart
    pub deleted: Vec<u32>,
}

impl RowAlignment {
    pub fn has_changes(&self) -> bool {
        !self.inserted.is_empty() || !self.deleted.is_empty()
    }
}

struct RowSignature {
    row: u32,
    cells: Vec<String>,
}

/// Two equally wide rows of normalized text are similar when at least 70% of
/// the cells that are non-empty on either side match. Two empty rows match.
pub fn rows_similar(reference: &[String], comparator: &[String]) -> bool {
    let mut total = 0usize;
    let mut matching = 0usize;
    for (a, b) in reference.iter().zip(comparator) {
        if a.is_empty() && b.is_empty() {
            continue;
        }
        total += 1;
        if a == b {
            matching += 1;
        }
    }
    total == 0 || matching * 10 >= total * 7
}

/// Align the rows of `comparator` against `reference`.
///
/// Returns `None` when either grid has more than [`MAX_ALIGNMENT_ROWS`] rows.
pub fn align_rows(reference: &SheetGrid, comparator: &SheetGrid) -> Option<RowAlignment> {
    if reference.row_count() > MAX_ALIGNMENT_ROWS || comparator.row_count() > MAX_ALIGNMENT_ROWS {
        debug!(
            reference_rows = reference.row_count(),
            comparator_rows = comparator.row_count(),
            "skipping row alignment"
        );
        return None;
    }

    let Some(columns) = column_span(reference, comparator) else {
        return Some(RowAlignment::default());
    };
    let old = signatures(reference, &columns);
    let new = signatures(comparator, &columns);
    let m = old.len();
    let n = new.len();

    // Row counts are capped well below u16::MAX.
    let mut dp = vec![vec![0u16; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[i][j] = if rows_similar(&old[i].cells, &new[j].cells) {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut alignment = RowAlignment::default();
    let (mut i, mut j) = (0usize, 0usize);
    while i < m && j < n {
        if rows_similar(&old[i].cells, &new[j].cells) {
            alignment.matched.push((old[i].row, new[j].row));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            alignment.deleted.push(old[i].row);
            i += 1;
        } else {
            alignment.inserted.push(new[j].row);
            j += 1;
        }
    }
    alignment.deleted.extend(old[i..].iter().map(|s| s.row));
    alignment.inserted.extend(new[j..].iter().map(|s| s.row));

    debug!(
        matched = alignment.matched.len(),
        inserted = alignment.inserted.len(),
        deleted = alignment.deleted.len(),
        "aligned rows"
    );
    Some(alignment)
}

/// Columns covered by either grid, `None` when both are empty.
fn column_span(reference: &SheetGrid, comparator: &SheetGrid) -> Option<RangeInclusive<u32>> {
    let bounds = [reference.bounds(), comparator.bounds()];
    let mut present = bounds.iter().flatten();
    let first = present.next()?;
    let merged = present.fold(*first, |acc, b| acc.union(b));
    Some(merged.start.col..=merged.end.col)
}

fn signatures(grid: &SheetGrid, columns: &RangeInclusive<u32>) -> Vec<RowSignature> {
    let Some(bounds) = grid.bounds() else {
        return Vec::new();
    };
    (bounds.start.row..=bounds.end.row)
        .map(|row| RowSignature {
            row,
            cells: columns
                .clone()
                .map(|col| normalized(grid.formula_at(CellAddress::new(row, col))))
                .collect(),
        })
        .collect()
}

fn normalized(text: &str) -> String {
    let text = text.trim();
    if is_a_formula(text) {
        normalize_formula(text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_similarity_threshold() {
        assert!(rows_similar(
            &row(&["a", "b", "c", "d"]),
            &row(&["a", "b", "c", "x"])
        ));
        assert!(!rows_similar(&row(&["a", "b", "c"]), &row(&["a", "b", "x"])));
        assert!(rows_similar(&row(&["", ""]), &row(&["", ""])));
        assert!(rows_similar(&row(&["a", ""]), &row(&["a", ""])));
    }

    #[test]
    fn test_identical_grids_match_every_row() {
        let grid = SheetGrid::from_formulas("S", vec![vec!["1"], vec!["=A1"], vec!["=A2"]]);
        let alignment = align_rows(&grid, &grid).expect("alignment");
        assert_eq!(alignment.matched, vec![(1, 1), (2, 2), (3, 3)]);
        assert!(!alignment.has_changes());
    }

    #[test]
    fn test_empty_grids() {
        let empty = SheetGrid::new("S");
        assert_eq!(align_rows(&empty, &empty), Some(RowAlignment::default()));

        let grid = SheetGrid::from_formulas("S", vec![vec!["1"], vec!["2"]]);
        let alignment = align_rows(&empty, &grid).expect("alignment");
        assert_eq!(alignment.inserted, vec![1, 2]);
        assert!(alignment.matched.is_empty());
    }
}

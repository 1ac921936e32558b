use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info};

use cellscope_formulas::{is_a_formula, normalize_formula};
use cellscope_primitives::{CellAddress, CellRange, CellValue};
use cellscope_sheet::SheetGrid;

use crate::align::{align_rows, RowAlignment};

/// Numbers closer than this compare equal in value mode.
pub const VALUE_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Compare formula text; when false, compare computed values
    pub by_formula: bool,
    /// Treat formulas that only differ in their references as equal
    pub ignore_reference_only_differences: bool,
    /// Also compute a row alignment between the two grids
    pub detect_row_insertions: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            by_formula: true,
            ignore_reference_only_differences: false,
            detect_row_insertions: false,
        }
    }
}

/// One side of one cell inside a difference block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDifference {
    pub address: String,
    pub formula: String,
    pub value: CellValue,
    pub is_different: bool,
}

/// A rectangle of loosely clustered differences.
///
/// Both cell lists cover the whole rectangle in row-major order; only the
/// entries with `is_different` set actually differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceBlock {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
    pub reference_cells: Vec<CellDifference>,
    pub comparator_cells: Vec<CellDifference>,
}

impl DifferenceBlock {
    pub fn range(&self) -> CellRange {
        CellRange::new(
            CellAddress::new(self.start_row, self.start_col),
            CellAddress::new(self.end_row, self.end_col),
        )
    }

    /// Number of cells in the block that actually differ
    pub fn difference_count(&self) -> usize {
        self.reference_cells.iter().filter(|c| c.is_different).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub reference_sheet: String,
    pub comparator_sheet: String,
    pub difference_blocks: Vec<DifferenceBlock>,
    pub total_difference_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_alignment: Option<RowAlignment>,
}

impl ComparisonResult {
    pub fn is_identical(&self) -> bool {
        self.total_difference_count == 0
    }
}

/// Compare two grids cell by cell over the union of their extents.
///
/// A cell present in only one grid compares against an empty cell. Differing
/// cells are merged row-major into blocks: a cell joins the open block when it
/// lies within one row and one column of the block's bounding box, otherwise
/// the open block is closed and a new one starts.
pub fn compare(
    reference: &SheetGrid,
    comparator: &SheetGrid,
    options: &CompareOptions,
) -> ComparisonResult {
    let mut result = ComparisonResult {
        reference_sheet: reference.name.clone(),
        comparator_sheet: comparator.name.clone(),
        ..ComparisonResult::default()
    };
    if options.detect_row_insertions {
        result.row_alignment = align_rows(reference, comparator);
        if result.row_alignment.is_none() {
            debug!("grids too large for row alignment; positional comparison only");
        }
    }

    let bounds = match (reference.bounds(), comparator.bounds()) {
        (Some(a), Some(b)) => a.union(&b),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => return result,
    };

    let mut closed: Vec<CellRange> = Vec::new();
    let mut open: Option<CellRange> = None;
    for cell in bounds.iter() {
        if !cells_differ(reference, comparator, cell, options) {
            continue;
        }
        result.total_difference_count += 1;
        open = Some(match open {
            Some(current) if touches(&current, cell) => current.union(&CellRange::single(cell)),
            Some(current) => {
                closed.push(current);
                CellRange::single(cell)
            }
            None => CellRange::single(cell),
        });
    }
    closed.extend(open);

    result.difference_blocks = closed
        .into_iter()
        .map(|range| build_block(reference, comparator, range, options))
        .collect();

    info!(
        reference = %reference.name,
        comparator = %comparator.name,
        compared = bounds.size(),
        differences = result.total_difference_count,
        blocks = result.difference_blocks.len(),
        "comparison complete"
    );
    result
}

/// Chebyshev distance of at most one between `cell` and the box.
fn touches(range: &CellRange, cell: CellAddress) -> bool {
    let range = range.normalized();
    cell.row + 1 >= range.start.row
        && cell.row <= range.end.row + 1
        && cell.col + 1 >= range.start.col
        && cell.col <= range.end.col + 1
}

fn build_block(
    reference: &SheetGrid,
    comparator: &SheetGrid,
    range: CellRange,
    options: &CompareOptions,
) -> DifferenceBlock {
    let mut block = DifferenceBlock {
        start_row: range.start.row,
        start_col: range.start.col,
        end_row: range.end.row,
        end_col: range.end.col,
        reference_cells: Vec::with_capacity(range.size() as usize),
        comparator_cells: Vec::with_capacity(range.size() as usize),
    };
    for cell in range.iter() {
        let is_different = cells_differ(reference, comparator, cell, options);
        block.reference_cells.push(side(reference, cell, is_different));
        block.comparator_cells.push(side(comparator, cell, is_different));
    }
    block
}

fn side(grid: &SheetGrid, cell: CellAddress, is_different: bool) -> CellDifference {
    CellDifference {
        address: cell.to_a1(),
        formula: grid.formula_at(cell).to_string(),
        value: grid.value_at(cell),
        is_different,
    }
}

fn cells_differ(
    reference: &SheetGrid,
    comparator: &SheetGrid,
    cell: CellAddress,
    options: &CompareOptions,
) -> bool {
    if options.by_formula {
        formulas_differ(
            reference.formula_at(cell),
            comparator.formula_at(cell),
            options.ignore_reference_only_differences,
        )
    } else {
        values_differ(&reference.value_at(cell), &comparator.value_at(cell))
    }
}

fn formulas_differ(a: &str, b: &str, ignore_references: bool) -> bool {
    if !ignore_references {
        return a != b;
    }
    comparable(a) != comparable(b)
}

fn comparable(text: &str) -> Cow<'_, str> {
    if is_a_formula(text) {
        Cow::Owned(normalize_formula(text))
    } else {
        Cow::Borrowed(text)
    }
}

/// Value-mode cell test. Empty text counts as empty.
pub(crate) fn values_differ(a: &CellValue, b: &CellValue) -> bool {
    match (is_blank(a), is_blank(b)) {
        (true, true) => false,
        (true, false) | (false, true) => true,
        (false, false) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => (x - y).abs() > VALUE_TOLERANCE,
            _ => a.to_string() != b.to_string(),
        },
    }
}

fn is_blank(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::String(s) => s.is_empty(),
        _ => false,
    }
}

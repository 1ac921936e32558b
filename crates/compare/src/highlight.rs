use cellscope_formulas::CellReference;
use cellscope_primitives::{Highlight, HighlightCategory, Palette};

use crate::diff::ComparisonResult;

/// Difference fills for both sheets, reference side first, block by block.
/// Only cells that actually differ are filled.
pub fn difference_highlights(result: &ComparisonResult, palette: &Palette) -> Vec<Highlight> {
    let mut plan = Vec::new();
    for block in &result.difference_blocks {
        let sides = [
            (&result.reference_sheet, &block.reference_cells),
            (&result.comparator_sheet, &block.comparator_cells),
        ];
        for (sheet, cells) in sides {
            plan.extend(cells.iter().filter(|c| c.is_different).map(|cell| {
                Highlight::new(
                    CellReference::new(sheet.as_str(), &cell.address).qualified(),
                    HighlightCategory::Difference,
                    palette,
                )
            }));
        }
    }
    plan
}

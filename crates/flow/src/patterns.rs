use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use cellscope_formulas::{relative_signature, CellReference};
use cellscope_primitives::Palette;
use cellscope_sheet::SheetGrid;

/// Formula cells sharing one relative signature (the same formula filled
/// down or across).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaPattern {
    pub signature: String,
    pub color: String,
    /// First formula of the group as written
    pub example: String,
    pub addresses: Vec<String>,
}

/// Group a sheet's formula cells by relative signature, in row-major order of
/// first appearance, coloring groups by cycling the palette's pattern colors.
pub fn formula_patterns(grid: &SheetGrid, palette: &Palette) -> Vec<FormulaPattern> {
    let mut groups: IndexMap<String, (String, Vec<String>)> = IndexMap::new();
    for (cell, text) in grid.formula_cells() {
        let signature = relative_signature(text.trim(), cell);
        let address = CellReference::new(grid.name.as_str(), &cell.to_a1()).qualified();
        groups
            .entry(signature)
            .or_insert_with(|| (text.to_string(), Vec::new()))
            .1
            .push(address);
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(index, (signature, (example, addresses)))| FormulaPattern {
            signature,
            color: palette.pattern_color(index).to_string(),
            example,
            addresses,
        })
        .collect()
}

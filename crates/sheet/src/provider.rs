use crate::grid::SheetGrid;

/// Sheet names compare case-insensitively, with full Unicode case folding.
pub fn same_sheet_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Read access to the host document's formula grids.
///
/// The analysis crates only ever read through this trait; fetching and
/// batching host calls is the implementor's business.
pub trait CellFormulaProvider {
    /// Sheet names in document order
    fn sheet_names(&self) -> Vec<String>;

    /// Formula/value grid for a sheet, `None` when the sheet does not exist
    fn grid(&self, sheet: &str) -> Option<&SheetGrid>;

    /// The provider's spelling of a sheet name, matched case-insensitively
    fn canonical_sheet_name(&self, name: &str) -> Option<String> {
        self.sheet_names()
            .into_iter()
            .find(|candidate| same_sheet_name(candidate, name))
    }

    /// Formula text at a sheet cell; empty when the sheet or cell is missing
    fn formula_text(&self, sheet: &str, address: cellscope_primitives::CellAddress) -> &str {
        self.grid(sheet).map_or("", |grid| grid.formula_at(address))
    }
}

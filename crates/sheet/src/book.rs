use indexmap::IndexMap;
use std::path::Path;

use crate::error::{Result, SheetError};
use crate::grid::SheetGrid;
use crate::provider::{same_sheet_name, CellFormulaProvider};

/// An ordered set of sheet grids (preserves insertion order)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: IndexMap<String, SheetGrid>,
}

impl Workbook {
    /// Create a new empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet, replacing any existing sheet of the same name
    pub fn add_sheet(&mut self, grid: SheetGrid) -> &mut Self {
        self.sheets.insert(grid.name.clone(), grid);
        self
    }

    #[must_use]
    pub fn with_sheet(mut self, grid: SheetGrid) -> Self {
        self.add_sheet(grid);
        self
    }

    /// Look up a sheet by name (case-insensitive)
    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.get(name).or_else(|| {
            self.sheets
                .iter()
                .find(|(key, _)| same_sheet_name(key, name))
                .map(|(_, grid)| grid)
        })
    }

    /// Like [`Workbook::sheet`], failing with `SheetNotFound`
    pub fn require_sheet(&self, name: &str) -> Result<&SheetGrid> {
        self.sheet(name).ok_or_else(|| SheetError::SheetNotFound {
            name: name.to_string(),
        })
    }

    pub fn sheets(&self) -> impl Iterator<Item = &SheetGrid> {
        self.sheets.values()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Check every grid fits on a worksheet
    pub fn validate(&self) -> Result<()> {
        self.sheets.values().try_for_each(SheetGrid::validate)
    }

    /// Load from `.json` or `.xlsx`/`.xlsm`, chosen by extension
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Self::from_json_file(path),
            #[cfg(not(target_arch = "wasm32"))]
            "xlsx" | "xlsm" => Self::from_xlsx(path),
            other => Err(SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unsupported workbook format '{other}'"),
            ))),
        }
    }
}

impl CellFormulaProvider for Workbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn grid(&self, sheet: &str) -> Option<&SheetGrid> {
        self.sheet(sheet)
    }
}

//! Workbook grid JSON:
//!
//! ```json
//! {"sheets": [{"name": "Sheet1", "anchor": "A1",
//!              "formulas": [["10"], ["=A1*2"]],
//!              "values": [[10], [20]]}]}
//! ```
//!
//! `anchor` defaults to `A1`, `values` may be omitted, and formula cells may be
//! given as JSON numbers or booleans for constants.

use serde::{Deserialize, Serialize};
use std::path::Path;

use cellscope_primitives::{CellAddress, CellValue};

use crate::book::Workbook;
use crate::error::{Result, SheetError};
use crate::grid::SheetGrid;

#[derive(Debug, Serialize, Deserialize)]
struct WorkbookDocument {
    sheets: Vec<SheetDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SheetDocument {
    name: String,
    #[serde(default = "default_anchor")]
    anchor: String,
    #[serde(default)]
    formulas: Vec<Vec<CellValue>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<Vec<CellValue>>,
}

fn default_anchor() -> String {
    "A1".to_string()
}

impl SheetDocument {
    fn into_grid(self) -> Result<SheetGrid> {
        let anchor =
            CellAddress::from_a1(&self.anchor).map_err(|_| SheetError::InvalidScope {
                scope: format!("{}!{}", self.name, self.anchor),
                reason: "anchor is not a cell address".to_string(),
            })?;
        let mut grid = SheetGrid::with_anchor(self.name, anchor);
        grid.formulas = self
            .formulas
            .into_iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        grid.values = self.values;
        grid.validate()?;
        Ok(grid)
    }

    fn from_grid(grid: &SheetGrid) -> Self {
        Self {
            name: grid.name.clone(),
            anchor: grid.anchor.to_a1(),
            formulas: grid
                .formulas
                .iter()
                .map(|row| row.iter().map(|text| CellValue::String(text.clone())).collect())
                .collect(),
            values: grid.values.clone(),
        }
    }
}

impl Workbook {
    /// Parse a workbook from JSON text
    ///
    /// # Errors
    ///
    /// Returns error on malformed JSON, a bad anchor, or an oversized grid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: WorkbookDocument = serde_json::from_str(json)?;
        let mut book = Workbook::new();
        for sheet in document.sheets {
            book.add_sheet(sheet.into_grid()?);
        }
        tracing::debug!(sheets = book.len(), "loaded workbook from JSON");
        Ok(book)
    }

    /// Load a workbook from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to the JSON shape accepted by [`Workbook::from_json_str`]
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        let document = WorkbookDocument {
            sheets: self.sheets().map(SheetDocument::from_grid).collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let book = Workbook::from_json_str(
            r#"{"sheets":[{"name":"Sheet1","formulas":[["10", 2.5],["=A1*2", true]]}]}"#,
        )
        .expect("parse");
        let grid = book.sheet("Sheet1").expect("sheet");
        assert_eq!(grid.anchor, CellAddress::new(1, 1));
        assert_eq!(grid.formulas[0], vec!["10", "2.5"]);
        assert_eq!(grid.formulas[1], vec!["=A1*2", "TRUE"]);
        assert!(grid.values.is_empty());
    }

    #[test]
    fn test_anchor_and_values() {
        let book = Workbook::from_json_str(
            r#"{"sheets":[{"name":"S","anchor":"$C$4","formulas":[["=1"]],"values":[[1]]}]}"#,
        )
        .expect("parse");
        let grid = book.sheet("S").expect("sheet");
        assert_eq!(grid.formula_at(CellAddress::new(4, 3)), "=1");
        assert_eq!(grid.value_at(CellAddress::new(4, 3)), CellValue::Int(1));
    }

    #[test]
    fn test_bad_anchor() {
        let err = Workbook::from_json_str(
            r#"{"sheets":[{"name":"S","anchor":"Top","formulas":[]}]}"#,
        )
        .expect_err("bad anchor");
        assert!(matches!(err, SheetError::InvalidScope { .. }));
        assert!(matches!(
            Workbook::from_json_str("{"),
            Err(SheetError::Json(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let book = Workbook::new().with_sheet(
            SheetGrid::from_formulas("Calc", vec![vec!["1", "=A1+1"]])
                .with_values(vec![vec![CellValue::Int(1), CellValue::Int(2)]]),
        );
        let json = book.to_json_string().expect("serialize");
        assert_eq!(Workbook::from_json_str(&json).expect("parse"), book);
    }
}

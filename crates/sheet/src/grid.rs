use serde::{Deserialize, Serialize};

use cellscope_formulas::is_a_formula;
use cellscope_primitives::{CellAddress, CellRange, CellValue};

use crate::error::{Result, SheetError};

/// One sheet's formula text and computed values, as read from the host.
///
/// `formulas[r][c]` and `values[r][c]` describe the cell at `anchor` offset by
/// `(r, c)`. Rows may be ragged; missing cells read as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetGrid {
    pub name: String,
    pub anchor: CellAddress,
    pub formulas: Vec<Vec<String>>,
    #[serde(default)]
    pub values: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    /// Create an empty grid anchored at `A1`
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_anchor(name, CellAddress::new(1, 1))
    }

    pub fn with_anchor(name: impl Into<String>, anchor: CellAddress) -> Self {
        Self {
            name: name.into(),
            anchor,
            formulas: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Grid anchored at `A1` from rows of formula text
    pub fn from_formulas<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut grid = Self::new(name);
        grid.formulas = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        grid
    }

    #[must_use]
    pub fn with_values(mut self, values: Vec<Vec<CellValue>>) -> Self {
        self.values = values;
        self
    }

    /// Number of rows covered by either grid
    pub fn row_count(&self) -> usize {
        self.formulas.len().max(self.values.len())
    }

    /// Width of the widest row in either grid
    pub fn col_count(&self) -> usize {
        let formulas = self.formulas.iter().map(Vec::len).max().unwrap_or(0);
        let values = self.values.iter().map(Vec::len).max().unwrap_or(0);
        formulas.max(values)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.col_count() == 0
    }

    /// Absolute bounding range, `None` for an empty grid
    pub fn bounds(&self) -> Option<CellRange> {
        if self.is_empty() {
            return None;
        }
        let end = self.anchor.offset(
            self.row_count() as i64 - 1,
            self.col_count() as i64 - 1,
        )?;
        Some(CellRange::new(self.anchor, end))
    }

    /// Reject grids that would run past the last worksheet row or column
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() || self.bounds().is_some() {
            return Ok(());
        }
        Err(SheetError::GridOutOfBounds {
            sheet: self.name.clone(),
            anchor: self.anchor.to_a1(),
            rows: self.row_count(),
            cols: self.col_count(),
        })
    }

    fn offset_of(&self, address: CellAddress) -> Option<(usize, usize)> {
        let row = address.row.checked_sub(self.anchor.row)?;
        let col = address.col.checked_sub(self.anchor.col)?;
        Some((row as usize, col as usize))
    }

    /// Formula text at an absolute address; empty outside the grid
    pub fn formula_at(&self, address: CellAddress) -> &str {
        self.offset_of(address)
            .and_then(|(r, c)| self.formulas.get(r).and_then(|row| row.get(c)))
            .map_or("", String::as_str)
    }

    /// Computed value at an absolute address; `Null` outside the grid
    pub fn value_at(&self, address: CellAddress) -> CellValue {
        self.offset_of(address)
            .and_then(|(r, c)| self.values.get(r).and_then(|row| row.get(c)))
            .cloned()
            .unwrap_or_default()
    }

    /// Set formula text at an absolute address, growing the grid as needed
    pub fn set_formula(&mut self, address: CellAddress, text: impl Into<String>) {
        let Some((r, c)) = self.offset_of(address) else {
            return;
        };
        if self.formulas.len() <= r {
            self.formulas.resize_with(r + 1, Vec::new);
        }
        let row = &mut self.formulas[r];
        if row.len() <= c {
            row.resize_with(c + 1, String::new);
        }
        row[c] = text.into();
    }

    /// Non-empty cells with their text, row-major
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &str)> + '_ {
        self.formulas.iter().enumerate().flat_map(move |(r, row)| {
            row.iter().enumerate().filter_map(move |(c, text)| {
                if text.trim().is_empty() {
                    return None;
                }
                let address = self.anchor.offset(r as i64, c as i64)?;
                Some((address, text.as_str()))
            })
        })
    }

    /// Cells whose text is a formula (starts with `=`), row-major
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> + '_ {
        self.cells().filter(|(_, text)| is_a_formula(text))
    }
}

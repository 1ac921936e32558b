//! # cellscope-primitives
//!
//! Core primitives shared by the cellscope crates: cell coordinates, rectangular
//! ranges, A1 address conversion, cell values and highlight colors.
//!
//! Coordinates are 1-based on both axes, matching what a user reads in A1
//! notation (`A1` is row 1, column 1).

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod address;
pub mod palette;
pub mod value;

pub use address::{
    address_to_coordinates, column_letters_to_number, column_number_to_letters,
    coordinates_to_address, normalize_address, parse_range, range_contains, split_sheet_prefix,
    unquote_sheet_name, MAX_COLUMN_COUNT, MAX_ROW_COUNT,
};
pub use palette::{Highlight, HighlightCategory, Palette};
pub use value::CellValue;

/// A single cell position. Both `row` and `col` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse from A1 notation (e.g., "A1", "$B$2")
    pub fn from_a1(s: &str) -> Result<Self> {
        address_to_coordinates(s)
    }

    /// Convert to relative A1 notation
    pub fn to_a1(&self) -> String {
        coordinates_to_address(self.row, self.col)
    }

    /// Address shifted by the given offsets, or `None` when it would leave the sheet.
    pub fn offset(&self, d_row: i64, d_col: i64) -> Option<Self> {
        let row = i64::from(self.row) + d_row;
        let col = i64::from(self.col) + d_col;
        if row < 1 || col < 1 || row > i64::from(MAX_ROW_COUNT) || col > i64::from(MAX_COLUMN_COUNT)
        {
            return None;
        }
        Some(Self::new(row as u32, col as u32))
    }
}

/// A rectangular range of cells (e.g., A1:B10), inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self { start, end }
    }

    /// Single-cell range
    pub fn single(cell: CellAddress) -> Self {
        Self::new(cell, cell)
    }

    /// Return a normalized range where start <= end
    pub fn normalized(&self) -> Self {
        let start_row = self.start.row.min(self.end.row);
        let end_row = self.start.row.max(self.end.row);
        let start_col = self.start.col.min(self.end.col);
        let end_col = self.start.col.max(self.end.col);
        Self {
            start: CellAddress::new(start_row, start_col),
            end: CellAddress::new(end_row, end_col),
        }
    }

    /// Number of rows in the range
    pub fn rows(&self) -> u32 {
        let range = self.normalized();
        range.end.row - range.start.row + 1
    }

    /// Number of columns in the range
    pub fn cols(&self) -> u32 {
        let range = self.normalized();
        range.end.col - range.start.col + 1
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        let range = self.normalized();
        addr.row >= range.start.row
            && addr.row <= range.end.row
            && addr.col >= range.start.col
            && addr.col <= range.end.col
    }

    /// Check if another range lies entirely inside this one
    pub fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(&other.start) && self.contains(&other.end)
    }

    /// Smallest range covering both `self` and `other`
    pub fn union(&self, other: &CellRange) -> Self {
        let a = self.normalized();
        let b = other.normalized();
        Self::new(
            CellAddress::new(a.start.row.min(b.start.row), a.start.col.min(b.start.col)),
            CellAddress::new(a.end.row.max(b.end.row), a.end.col.max(b.end.col)),
        )
    }

    /// Get total number of cells in range
    pub fn size(&self) -> u64 {
        u64::from(self.rows()) * u64::from(self.cols())
    }

    /// Iterate over all addresses in row-major order
    pub fn iter(&self) -> CellRangeIter {
        let range = self.normalized();
        CellRangeIter {
            current: range.start,
            start: range.start,
            end: range.end,
            done: false,
        }
    }
}

/// Errors that can occur when parsing addresses or colors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid color for {category}: {value} (expected #RRGGBB)")]
    InvalidColor { category: String, value: String },
}

pub type Result<T> = std::result::Result<T, AddressError>;

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Iterator over a cell range in row-major order
pub struct CellRangeIter {
    current: CellAddress,
    start: CellAddress,
    end: CellAddress,
    done: bool,
}

impl Iterator for CellRangeIter {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        if self.current.row == self.end.row && self.current.col == self.end.col {
            self.done = true;
            return Some(result);
        }

        if self.current.col < self.end.col {
            self.current.col += 1;
        } else {
            self.current.col = self.start.col;
            self.current.row += 1;
        }

        Some(result)
    }
}

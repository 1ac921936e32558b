//! Comparison of two sheet grids.
//!
//! [`compare`] walks the union of both grids cell by cell, by formula text or
//! by computed value, and groups the differing cells into rectangular
//! [`DifferenceBlock`]s. [`align_rows`] optionally pairs up rows of the two
//! grids so inserted and deleted rows can be reported separately.

pub mod align;
pub mod diff;
pub mod highlight;

pub use align::{align_rows, rows_similar, RowAlignment, MAX_ALIGNMENT_ROWS};
pub use diff::{
    compare, CellDifference, CompareOptions, ComparisonResult, DifferenceBlock, VALUE_TOLERANCE,
};
pub use highlight::difference_highlights;

//! Host-document side of cellscope.
//!
//! The analysis crates never talk to a live spreadsheet. They read formula
//! grids through [`CellFormulaProvider`]; [`Workbook`] is the in-memory
//! implementation, loadable from grid JSON or an `.xlsx` file.
//!
//! ```
//! use cellscope_sheet::{CellFormulaProvider, Scope, SheetGrid, Workbook};
//!
//! let book = Workbook::new().with_sheet(SheetGrid::from_formulas(
//!     "Sheet1",
//!     vec![vec!["10"], vec!["=A1*2"]],
//! ));
//! let scope = Scope::parse("sheet1").unwrap().validate(&book).unwrap();
//! assert_eq!(scope, Scope::sheet("Sheet1"));
//! assert_eq!(book.grid("Sheet1").unwrap().formula_cells().count(), 1);
//! ```

pub mod book;
pub mod error;
pub mod grid;
pub mod json;
pub mod provider;
pub mod scope;
#[cfg(not(target_arch = "wasm32"))]
pub mod xlsx;

pub use book::Workbook;
pub use error::{Result, SheetError};
pub use grid::SheetGrid;
pub use provider::{same_sheet_name, CellFormulaProvider};
pub use scope::Scope;

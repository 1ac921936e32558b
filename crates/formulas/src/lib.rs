//! # cellscope-formulas
//!
//! Structural formula analysis: reference token scanning and resolution,
//! a precedence-aware expression tree parser, and annotation passes for
//! branching and lookup functions. Nothing here evaluates a formula.

use cellscope_primitives::AddressError;

pub mod annotate;
pub mod parser;
pub mod refs;
pub mod utils;

pub use annotate::{annotate_branches, target_location_label, FunctionKind};
pub use parser::{parse, FormulaNode, NodeKind};
pub use refs::{
    extract_references, is_reference, normalize_formula, parse_reference, relative_signature,
    CellReference, FormulaReference, ReferenceKind, ReferenceMode, REFERENCE_PLACEHOLDER,
};
pub use utils::{check_formula, is_a_formula, is_balanced_parenthesis};

/// Formula errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Malformed formula: {0}")]
    MalformedFormula(String),
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),
}

impl From<AddressError> for FormulaError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::InvalidAddress(address) => FormulaError::InvalidAddress(address),
            other => FormulaError::InvalidAddress(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormulaError>;

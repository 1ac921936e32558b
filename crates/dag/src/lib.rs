//! Dependency graph over a scoped region of spreadsheet formulas.
//!
//! Keys are fully-qualified addresses (`Sheet1!A1`, `Sheet1!A1:A10`,
//! `[Book]Sheet!B2`). Ranges stay atomic nodes: `=SUM(A1:A10)` depends on the
//! key `Sheet1!A1:A10`, not on ten cells. References that can only be known
//! by evaluating (`INDIRECT`, the target of `OFFSET`) never become edges.

use serde::{Deserialize, Serialize};
use std::fmt;

use cellscope_sheet::SheetError;

pub mod build;
pub mod graph;

pub use build::build_graph;
pub use graph::{DependencyEntry, DependencyGraph, Direction, TraceStep};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    InvalidAddress,
    UnresolvedReference,
    MalformedFormula,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::InvalidAddress => "invalid address",
            DiagnosticKind::UnresolvedReference => "unresolved reference",
            DiagnosticKind::MalformedFormula => "malformed formula",
        })
    }
}

/// A cell-local problem found while analyzing. Never fatal to the whole scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub address: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(address: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.address, self.kind, self.message)
    }
}

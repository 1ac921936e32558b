//! Flow classification over a dependency graph.
//!
//! Two independent views:
//! - a true partition of the in-scope formula cells into input, calculation,
//!   output and orphan, counting only formula-to-formula edges inside scope;
//! - an overlay relative to a focus area: inflow/outflow cells and the
//!   outside precedents/dependents that feed or consume them.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub mod classify;
pub mod highlight;
pub mod patterns;

pub use classify::{
    analyze_flow, classify_inflows_outflows, classify_inputs_outputs, Classification,
    FlowOverlay, FlowReport,
};
pub use cellscope_primitives::Highlight;
pub use highlight::highlight_plan;
pub use patterns::{formula_patterns, FormulaPattern};

/// A named bucket of fully-qualified addresses, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGroup {
    pub label: String,
    pub addresses: IndexSet<String>,
}

impl CellGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            addresses: IndexSet::new(),
        }
    }

    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        self.addresses.insert(address.into())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(String::as_str)
    }
}

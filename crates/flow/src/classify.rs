use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use cellscope_dag::{DependencyEntry, DependencyGraph, Diagnostic, DiagnosticKind};
use cellscope_formulas::CellReference;
use cellscope_primitives::HighlightCategory;
use cellscope_sheet::Scope;

use crate::CellGroup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub inputs: CellGroup,
    pub calculations: CellGroup,
    pub outputs: CellGroup,
    pub orphans: CellGroup,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            inputs: CellGroup::new(HighlightCategory::Input.as_str()),
            calculations: CellGroup::new(HighlightCategory::Calculation.as_str()),
            outputs: CellGroup::new(HighlightCategory::Output.as_str()),
            orphans: CellGroup::new(HighlightCategory::Orphan.as_str()),
        }
    }
}

impl Classification {
    /// Groups paired with their highlight category
    pub fn groups(&self) -> [(HighlightCategory, &CellGroup); 4] {
        [
            (HighlightCategory::Input, &self.inputs),
            (HighlightCategory::Calculation, &self.calculations),
            (HighlightCategory::Output, &self.outputs),
            (HighlightCategory::Orphan, &self.orphans),
        ]
    }

    pub fn total(&self) -> usize {
        self.groups().iter().map(|(_, group)| group.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOverlay {
    pub inflows: CellGroup,
    pub outflows: CellGroup,
    pub outside_precedents: CellGroup,
    pub outside_dependents: CellGroup,
}

impl Default for FlowOverlay {
    fn default() -> Self {
        Self {
            inflows: CellGroup::new(HighlightCategory::Inflow.as_str()),
            outflows: CellGroup::new(HighlightCategory::Outflow.as_str()),
            outside_precedents: CellGroup::new(HighlightCategory::OutsidePrecedent.as_str()),
            outside_dependents: CellGroup::new(HighlightCategory::OutsideDependent.as_str()),
        }
    }
}

impl FlowOverlay {
    pub fn groups(&self) -> [(HighlightCategory, &CellGroup); 4] {
        [
            (HighlightCategory::OutsidePrecedent, &self.outside_precedents),
            (HighlightCategory::OutsideDependent, &self.outside_dependents),
            (HighlightCategory::Inflow, &self.inflows),
            (HighlightCategory::Outflow, &self.outflows),
        ]
    }
}

/// Both flow views plus the cells that had to be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowReport {
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<FlowOverlay>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl FlowReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Distinct addresses that could not be fully analyzed
    pub fn skipped_count(&self) -> usize {
        self.diagnostics
            .iter()
            .map(|d| d.address.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Parse a graph key, `None` if it is not a well-formed address.
fn locate(key: &str) -> Option<CellReference> {
    CellReference::from_qualified(key)
        .ok()
        .filter(|reference| reference.bounds().is_ok())
}

/// Requested scope narrowed to the sheets the graph was built over, so
/// references to unknown sheets stay out even under an open `Scope::workbook()`.
fn covered(graph: &DependencyGraph, scope: &Scope, reference: &CellReference) -> bool {
    graph.scope().contains_reference(reference) && scope.contains_reference(reference)
}

fn in_scope(graph: &DependencyGraph, scope: &Scope, key: &str) -> bool {
    locate(key).is_some_and(|reference| covered(graph, scope, &reference))
}

fn in_focus(focus: &Scope, key: &str) -> bool {
    locate(key).is_some_and(|reference| focus.contains_reference(&reference))
}

/// In-scope formula cells of the graph, skipping keys that do not parse.
fn scoped_formula_cells<'a>(
    graph: &'a DependencyGraph,
    scope: &Scope,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<(&'a str, &'a DependencyEntry)> {
    let mut cells = Vec::new();
    for (key, entry) in graph.entries() {
        if !entry.has_formula() {
            continue;
        }
        let Some(reference) = locate(key) else {
            warn!(address = %key, "skipping cell with unparseable address");
            diagnostics.push(Diagnostic::new(
                key,
                DiagnosticKind::InvalidAddress,
                "address cannot be converted to coordinates",
            ));
            continue;
        };
        if covered(graph, scope, &reference) {
            cells.push((key, entry));
        }
    }
    cells
}

fn classify_into(
    graph: &DependencyGraph,
    scope: &Scope,
    diagnostics: &mut Vec<Diagnostic>,
) -> Classification {
    let mut result = Classification::default();
    let counts = |key: &str, neighbour: &String| {
        neighbour != key && graph.has_formula(neighbour) && in_scope(graph, scope, neighbour)
    };

    for (key, entry) in scoped_formula_cells(graph, scope, diagnostics) {
        let has_precedents = entry.precedents.iter().any(|p| counts(key, p));
        let has_dependents = entry.dependents.iter().any(|d| counts(key, d));
        let group = match (has_precedents, has_dependents) {
            (false, false) => &mut result.orphans,
            (false, true) => &mut result.inputs,
            (true, false) => &mut result.outputs,
            (true, true) => &mut result.calculations,
        };
        group.insert(key);
    }

    debug!(
        inputs = result.inputs.len(),
        calculations = result.calculations.len(),
        outputs = result.outputs.len(),
        orphans = result.orphans.len(),
        "classified formula cells"
    );
    result
}

fn overlay_into(
    graph: &DependencyGraph,
    scope: &Scope,
    focus: &Scope,
    diagnostics: &mut Vec<Diagnostic>,
) -> FlowOverlay {
    let mut overlay = FlowOverlay::default();
    let outside_focus =
        |neighbour: &String| in_scope(graph, scope, neighbour) && !in_focus(focus, neighbour);

    for (key, entry) in scoped_formula_cells(graph, scope, diagnostics) {
        if !in_focus(focus, key) {
            continue;
        }
        for precedent in entry.precedents.iter().filter(|p| outside_focus(*p)) {
            overlay.inflows.insert(key);
            overlay.outside_precedents.insert(precedent.as_str());
        }
        for dependent in entry.dependents.iter().filter(|d| outside_focus(*d)) {
            overlay.outflows.insert(key);
            overlay.outside_dependents.insert(dependent.as_str());
        }
    }
    overlay
}

/// Partition every in-scope formula cell into input, calculation, output or orphan.
///
/// Only precedents/dependents that are themselves in-scope formula cells
/// count; hardcoded leaves, out-of-scope cells and self-references do not.
pub fn classify_inputs_outputs(graph: &DependencyGraph, scope: &Scope) -> FlowReport {
    let mut diagnostics = Vec::new();
    let classification = classify_into(graph, scope, &mut diagnostics);
    FlowReport {
        classification,
        overlay: None,
        diagnostics,
    }
}

/// Inflow/outflow overlay for the in-scope formula cells inside `focus`.
///
/// Any in-scope neighbour outside the focus area counts, formula-bearing or not.
pub fn classify_inflows_outflows(
    graph: &DependencyGraph,
    scope: &Scope,
    focus: &Scope,
) -> FlowOverlay {
    overlay_into(graph, scope, focus, &mut Vec::new())
}

/// Both views; the overlay only when a focus area is given.
pub fn analyze_flow(graph: &DependencyGraph, scope: &Scope, focus: Option<&Scope>) -> FlowReport {
    let mut diagnostics = Vec::new();
    let classification = classify_into(graph, scope, &mut diagnostics);
    // Unparseable keys were already reported by the classification pass.
    let overlay = focus.map(|focus| overlay_into(graph, scope, focus, &mut Vec::new()));
    let report = FlowReport {
        classification,
        overlay,
        diagnostics,
    };
    info!(
        classified = report.classification.total(),
        skipped = report.skipped_count(),
        focus = focus.is_some(),
        "flow analysis complete"
    );
    report
}

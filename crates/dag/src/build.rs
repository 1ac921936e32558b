use tracing::{debug, info, warn};

use cellscope_formulas::{check_formula, extract_references, CellReference};
use cellscope_sheet::{CellFormulaProvider, Scope};

use crate::graph::DependencyGraph;
use crate::{Diagnostic, DiagnosticKind, Result};

/// Build the dependency graph for every formula cell in `scope`.
///
/// The scope is validated first; naming a sheet the provider does not have is
/// the only error. Everything cell-local (bad addresses, references to
/// unknown sheets or other workbooks, unbalanced formulas) is recorded as a
/// diagnostic and the scan continues.
pub fn build_graph(scope: &Scope, provider: &dyn CellFormulaProvider) -> Result<DependencyGraph> {
    let scope = scope.validate(provider)?;
    let mut graph = DependencyGraph::new(scope.clone());
    let mut edges: Vec<(String, String)> = Vec::new();
    let mut scanned = 0usize;

    // Pass one: precedents of every in-scope formula cell.
    for sheet in scope.sheets() {
        let Some(grid) = provider.grid(sheet) else {
            continue;
        };
        for (cell, text) in grid.formula_cells() {
            if !scope.contains(sheet, cell) {
                continue;
            }
            scanned += 1;
            let key = CellReference::new(sheet, &cell.to_a1()).qualified();
            graph.add_formula(key.clone(), text);

            if let Err(err) = check_formula(text) {
                warn!(address = %key, error = %err, "formula is malformed; references may be incomplete");
                graph.push_diagnostic(Diagnostic::new(
                    &key,
                    DiagnosticKind::MalformedFormula,
                    err.to_string(),
                ));
            }

            for token in extract_references(text) {
                let mut reference = token.resolve(sheet);
                if let Err(err) = reference.bounds() {
                    warn!(address = %key, token = %token.text, "skipping invalid reference");
                    graph.push_diagnostic(Diagnostic::new(
                        &key,
                        DiagnosticKind::InvalidAddress,
                        err.to_string(),
                    ));
                    continue;
                }

                let known_sheet = if reference.workbook.is_none() {
                    provider.canonical_sheet_name(&reference.sheet)
                } else {
                    None
                };
                match known_sheet {
                    Some(canonical) => reference.sheet = canonical,
                    None => {
                        debug!(address = %key, reference = %reference.qualified(), "unresolved reference kept as leaf");
                        graph.push_diagnostic(Diagnostic::new(
                            &key,
                            DiagnosticKind::UnresolvedReference,
                            format!("{} is not in the supplied workbook", reference.qualified()),
                        ));
                    }
                }

                edges.push((key.clone(), reference.qualified()));
            }
        }
    }
    debug!(scanned, edges = edges.len(), "collected precedents");

    // Pass two: mirror every edge; unscanned targets become empty leaves.
    for (formula, precedent) in &edges {
        graph.add_edge(formula, precedent);
    }

    info!(
        scope = %scope,
        entries = graph.len(),
        formulas = graph.formula_count(),
        diagnostics = graph.diagnostics().len(),
        "built dependency graph"
    );
    Ok(graph)
}

//! Plain-text rendering of analysis results.

use colored::Colorize;
use std::collections::HashSet;
use std::fmt::Write;

use cellscope_compare::ComparisonResult;
use cellscope_dag::{DependencyGraph, Diagnostic, TraceStep};
use cellscope_flow::{FlowReport, FormulaPattern, Highlight};
use cellscope_formulas::{FormulaReference, ReferenceKind, ReferenceMode};

fn kind_label(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Cell => "cell",
        ReferenceKind::Range => "range",
        ReferenceKind::ColumnRange => "columns",
        ReferenceKind::RowRange => "rows",
    }
}

fn mode_label(mode: ReferenceMode) -> &'static str {
    match mode {
        ReferenceMode::Relative => "relative",
        ReferenceMode::Absolute => "absolute",
        ReferenceMode::Mixed => "mixed",
    }
}

pub fn references(references: &[FormulaReference], sheet: &str, normalized: &str) -> String {
    let mut out = String::new();
    for reference in references {
        let _ = writeln!(
            out,
            "{:<24} {:<8} {:<9} {}",
            reference.text,
            kind_label(reference.kind),
            mode_label(reference.mode),
            reference.resolve(sheet).qualified()
        );
    }
    let _ = writeln!(out, "{} {normalized}", "normalized:".cyan());
    out
}

pub fn graph(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    for (key, entry) in graph.entries() {
        if entry.has_formula() {
            let _ = writeln!(out, "{} {}", key.bold(), entry.formula_text);
        } else {
            let _ = writeln!(out, "{}", key.bold());
        }
        if !entry.precedents.is_empty() {
            let list: Vec<&str> = entry.precedents.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  precedents: {}", list.join(", "));
        }
        if !entry.dependents.is_empty() {
            let list: Vec<&str> = entry.dependents.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  dependents: {}", list.join(", "));
        }
    }
    let _ = writeln!(
        out,
        "{} entries, {} formulas",
        graph.len(),
        graph.formula_count()
    );
    out
}

pub fn trace(start: &str, steps: &[TraceStep]) -> String {
    let mut out = format!("{}\n", start.bold());
    for step in steps {
        let _ = writeln!(out, "{}{}", "  ".repeat(step.depth), step.address);
    }
    out
}

pub fn flow(report: &FlowReport) -> String {
    let mut out = String::new();
    let overlay = report.overlay.iter().flat_map(|overlay| overlay.groups());
    for (_, group) in report.classification.groups().into_iter().chain(overlay) {
        let _ = writeln!(out, "{} ({})", group.label.cyan().bold(), group.len());
        for address in group.iter() {
            let _ = writeln!(out, "  {address}");
        }
    }
    out
}

pub fn patterns(patterns: &[FormulaPattern]) -> String {
    let mut out = String::new();
    for pattern in patterns {
        let _ = writeln!(
            out,
            "{} {} ({} cells, e.g. {})",
            pattern.color,
            pattern.signature.bold(),
            pattern.addresses.len(),
            pattern.example
        );
        for address in &pattern.addresses {
            let _ = writeln!(out, "  {address}");
        }
    }
    out
}

pub fn highlights(plan: &[Highlight]) -> String {
    let mut out = String::new();
    for highlight in plan {
        let _ = writeln!(
            out,
            "{:<24} {:<18} {}",
            highlight.address,
            highlight.category.as_str(),
            highlight.color
        );
    }
    out
}

pub fn comparison(result: &ComparisonResult, by_formula: bool) -> String {
    let mut out = String::new();
    if result.is_identical() {
        let _ = writeln!(out, "{}", "No differences".green());
    } else {
        let _ = writeln!(
            out,
            "{} differences in {} blocks",
            result.total_difference_count.to_string().red().bold(),
            result.difference_blocks.len()
        );
    }

    for block in &result.difference_blocks {
        let _ = writeln!(out, "{}", block.range().to_string().bold());
        let cells = block.reference_cells.iter().zip(&block.comparator_cells);
        for (reference, comparator) in cells.filter(|(r, _)| r.is_different) {
            let (before, after) = if by_formula {
                (reference.formula.clone(), comparator.formula.clone())
            } else {
                (reference.value.to_string(), comparator.value.to_string())
            };
            let _ = writeln!(out, "  {}: {before:?} -> {after:?}", reference.address);
        }
    }

    if let Some(alignment) = &result.row_alignment {
        let join = |rows: &[u32]| {
            rows.iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(out, "inserted rows: {}", join(&alignment.inserted));
        let _ = writeln!(out, "deleted rows: {}", join(&alignment.deleted));
    }
    out
}

pub fn warning(message: &str) -> String {
    format!("{} {message}\n", "warning:".yellow().bold())
}

/// Soft warning for cells that could not be fully analyzed.
pub fn diagnostics(diagnostics: &[Diagnostic]) -> String {
    let skipped = diagnostics
        .iter()
        .map(|d| d.address.as_str())
        .collect::<HashSet<_>>()
        .len();
    if skipped == 0 {
        return String::new();
    }
    let mut out = warning(&format!("{skipped} cells could not be fully analyzed"));
    for diagnostic in diagnostics {
        let _ = writeln!(out, "  {diagnostic}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellscope_compare::{compare, CompareOptions};
    use cellscope_dag::DiagnosticKind;
    use cellscope_formulas::extract_references;
    use cellscope_sheet::SheetGrid;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_references_table() {
        plain();
        let refs = extract_references("=$A$1+Data!B2:C3");
        let text = references(&refs, "Sheet1", "=REF+REF");
        assert!(text.contains("Sheet1!A1"));
        assert!(text.contains("Data!B2:C3"));
        assert!(text.contains("absolute"));
        assert!(text.ends_with("normalized: =REF+REF\n"));
    }

    #[test]
    fn test_trace_indents_by_depth() {
        plain();
        let steps = vec![
            TraceStep {
                address: "S!A2".into(),
                depth: 1,
            },
            TraceStep {
                address: "S!A3".into(),
                depth: 2,
            },
        ];
        assert_eq!(trace("S!A1", &steps), "S!A1\n  S!A2\n    S!A3\n");
    }

    #[test]
    fn test_comparison_lists_changed_cells() {
        plain();
        let reference = SheetGrid::from_formulas("R", vec![vec!["1", "=A1"]]);
        let comparator = SheetGrid::from_formulas("C", vec![vec!["1", "=A1*2"]]);
        let result = compare(&reference, &comparator, &CompareOptions::default());
        let text = comparison(&result, true);
        assert!(text.starts_with("1 differences in 1 blocks"));
        assert!(text.contains("B1: \"=A1\" -> \"=A1*2\""));
    }

    #[test]
    fn test_diagnostics_only_when_skipped() {
        plain();
        assert!(diagnostics(&[]).is_empty());
        let found = vec![Diagnostic::new(
            "S!A1",
            DiagnosticKind::UnresolvedReference,
            "Ghost!A1 is not in the supplied workbook",
        )];
        let text = diagnostics(&found);
        assert!(text.starts_with("warning: 1 cells could not be fully analyzed"));
        assert!(text.contains("S!A1: unresolved reference"));
    }
}

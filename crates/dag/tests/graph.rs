use cellscope_dag::{build_graph, DependencyGraph, DiagnosticKind, Direction, GraphError};
use cellscope_sheet::{Scope, SheetError, SheetGrid, Workbook};

fn model() -> Workbook {
    Workbook::new()
        .with_sheet(SheetGrid::from_formulas(
            "Inputs",
            vec![vec!["Rate", "0.05"], vec!["Units", "120"]],
        ))
        .with_sheet(SheetGrid::from_formulas(
            "Calc",
            vec![
                vec!["=Inputs!B2*10", "=A1*(1+Inputs!B1)"],
                vec!["=SUM(A1:B1)", "=INDIRECT(\"A1\")"],
                vec!["=OFFSET(A1,1,0)", "=[Old.xlsx]Prices!C3+Ghost!A1"],
            ],
        ))
}

fn assert_symmetric(graph: &DependencyGraph) {
    for (key, entry) in graph.entries() {
        for precedent in &entry.precedents {
            let target = graph
                .get(precedent)
                .unwrap_or_else(|| panic!("{precedent} missing from graph"));
            assert!(
                target.dependents.contains(key),
                "{precedent} does not list {key} as a dependent"
            );
        }
        for dependent in &entry.dependents {
            let source = graph
                .get(dependent)
                .unwrap_or_else(|| panic!("{dependent} missing from graph"));
            assert!(source.precedents.contains(key));
        }
    }
}

#[test]
fn test_graph_is_symmetric() {
    let book = model();
    let graph = build_graph(&Scope::workbook(), &book).expect("graph");
    assert_symmetric(&graph);

    let graph = build_graph(&Scope::sheet("Calc"), &book).expect("graph");
    assert_symmetric(&graph);
}

#[test]
fn test_leaves_outside_scope_are_recorded() {
    let graph = build_graph(&Scope::sheet("Calc"), &model()).expect("graph");
    let leaf = graph.get("Inputs!B2").expect("leaf for cross-sheet precedent");
    assert!(leaf.formula_text.is_empty());
    assert!(leaf.precedents.is_empty());
    assert!(leaf.dependents.contains("Calc!A1"));
}

#[test]
fn test_ranges_are_atomic_keys() {
    let graph = build_graph(&Scope::sheet("Calc"), &model()).expect("graph");
    let sum = graph.get("Calc!A2").expect("sum cell");
    assert_eq!(
        sum.precedents.iter().collect::<Vec<_>>(),
        vec!["Calc!A1:B1"]
    );
    assert!(graph.get("Calc!A1:B1").expect("range node").dependents.contains("Calc!A2"));
    assert!(!graph.get("Calc!A1").expect("a1").dependents.contains("Calc!A2"));
}

#[test]
fn test_dynamic_references_are_not_followed() {
    let graph = build_graph(&Scope::sheet("Calc"), &model()).expect("graph");
    let indirect = graph.get("Calc!B2").expect("indirect cell");
    assert!(indirect.precedents.is_empty());
    assert!(indirect.has_formula());

    let offset = graph.get("Calc!A3").expect("offset cell");
    assert_eq!(offset.precedents.iter().collect::<Vec<_>>(), vec!["Calc!A1"]);
}

#[test]
fn test_unresolved_references_stay_as_leaves() {
    let graph = build_graph(&Scope::workbook(), &model()).expect("graph");
    let cell = graph.get("Calc!B3").expect("external cell");
    assert!(cell.precedents.contains("[Old.xlsx]Prices!C3"));
    assert!(cell.precedents.contains("Ghost!A1"));
    assert!(graph.get("Ghost!A1").expect("leaf").formula_text.is_empty());

    let unresolved: Vec<_> = graph
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnresolvedReference)
        .collect();
    assert_eq!(unresolved.len(), 2);
    assert_eq!(graph.skipped_count(), 1);
}

#[test]
fn test_sheet_names_use_provider_spelling() {
    let book = Workbook::new()
        .with_sheet(SheetGrid::from_formulas("Data", vec![vec!["1"]]))
        .with_sheet(SheetGrid::from_formulas("Sum", vec![vec!["=data!$a$1+'DATA'!A1"]]));
    let graph = build_graph(&Scope::sheet("sum"), &book).expect("graph");
    let entry = graph.get("Sum!A1").expect("formula cell");
    assert_eq!(entry.precedents.iter().collect::<Vec<_>>(), vec!["Data!A1"]);
    assert!(graph.diagnostics().is_empty());
}

#[test]
fn test_range_scope_only_scans_inside() {
    let scope = Scope::range("Calc", "A1:A2").expect("scope");
    let graph = build_graph(&scope, &model()).expect("graph");
    assert!(graph.has_formula("Calc!A1"));
    assert!(graph.has_formula("Calc!A2"));
    // B1 is referenced by A2 only through the range, and never scanned.
    assert!(!graph.has_formula("Calc!B1"));
    assert!(!graph.contains_key("Calc!B2"));
}

#[test]
fn test_invalid_addresses_are_skipped_with_diagnostic() {
    let book = Workbook::new().with_sheet(SheetGrid::from_formulas(
        "S",
        vec![vec!["=A0+B1", "=C1"]],
    ));
    let graph = build_graph(&Scope::sheet("S"), &book).expect("graph");
    let entry = graph.get("S!A1").expect("cell");
    assert_eq!(entry.precedents.iter().collect::<Vec<_>>(), vec!["S!B1"]);
    assert!(graph
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::InvalidAddress && d.address == "S!A1"));
    assert!(graph.has_formula("S!B1"));
}

#[test]
fn test_malformed_formula_is_diagnosed() {
    let book = Workbook::new().with_sheet(SheetGrid::from_formulas(
        "S",
        vec![vec!["=SUM(B1,B2"]],
    ));
    let graph = build_graph(&Scope::sheet("S"), &book).expect("graph");
    assert_eq!(graph.get("S!A1").expect("cell").precedents.len(), 2);
    assert_eq!(graph.diagnostics()[0].kind, DiagnosticKind::MalformedFormula);
}

#[test]
fn test_missing_scope_sheet_is_fatal() {
    let err = build_graph(&Scope::sheet("Nowhere"), &model()).expect_err("precondition");
    assert!(matches!(
        err,
        GraphError::Sheet(SheetError::SheetNotFound { .. })
    ));
}

#[test]
fn test_self_reference_recorded() {
    let book = Workbook::new().with_sheet(SheetGrid::from_formulas("S", vec![vec!["=A1+1"]]));
    let graph = build_graph(&Scope::sheet("S"), &book).expect("graph");
    let entry = graph.get("S!A1").expect("cell");
    assert!(entry.precedents.contains("S!A1"));
    assert!(entry.dependents.contains("S!A1"));
    assert_eq!(graph.trace("S!A1", Direction::Precedents, 0).len(), 0);
}

#[test]
fn test_graph_serializes_to_json() {
    let graph = build_graph(&Scope::sheet("Calc"), &model()).expect("graph");
    let json = graph.to_json().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(value["scope"]["type"], "sheet");
    assert_eq!(value["entries"]["Calc!A1"]["formula_text"], "=Inputs!B2*10");
    let back: DependencyGraph = serde_json::from_str(&json).expect("roundtrip");
    assert_eq!(back, graph);
}

use cellscope_formulas::{annotate_branches, parse, FormulaNode, NodeKind};
use cellscope_primitives::CellValue;

fn child(node: &FormulaNode, index: usize) -> &FormulaNode {
    node.children
        .get(index)
        .unwrap_or_else(|| panic!("missing child {index} of {}", node.source))
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let root = parse("=1+2*3");
    assert_eq!(root.kind, NodeKind::Operator);
    assert_eq!(root.text, "+");
    assert_eq!(child(&root, 0).text, "1");

    let right = child(&root, 1);
    assert_eq!(right.kind, NodeKind::Operator);
    assert_eq!(right.text, "*");
    assert_eq!(child(right, 0).kind, NodeKind::Literal);
    assert_eq!(child(right, 0).text, "2");
    assert_eq!(child(right, 1).text, "3");
}

#[test]
fn test_comparison_is_lowest_precedence() {
    let root = parse("=A1&\"x\"=B1+1");
    assert_eq!(root.text, "=");
    assert_eq!(child(&root, 0).text, "&");
    assert_eq!(child(&root, 1).text, "+");
}

#[test]
fn test_power_binds_tightest() {
    let root = parse("=2*3^2");
    assert_eq!(root.text, "*");
    assert_eq!(child(&root, 1).text, "^");
}

#[test]
fn test_if_arguments_split_outside_quotes() {
    let root = parse("=IF(A1>0,\"a,b\",C1)");
    assert_eq!(root.kind, NodeKind::Function);
    assert_eq!(root.text, "IF");
    assert_eq!(root.children.len(), 3);

    let condition = child(&root, 0);
    assert_eq!(condition.text, ">");
    assert_eq!(child(condition, 0).kind, NodeKind::Reference);

    let literal = child(&root, 1);
    assert_eq!(literal.kind, NodeKind::Literal);
    assert!(literal.text.contains("a,b"));

    let reference = child(&root, 2);
    assert_eq!(reference.kind, NodeKind::Reference);
    assert_eq!(reference.reference_address.as_deref(), Some("C1"));
}

#[test]
fn test_nested_functions_keep_argument_order() {
    let root = parse("=SUM(A1:A3,MAX(B1,B2),'My Sheet'!C1)");
    let names: Vec<_> = root.children.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(names, vec!["A1:A3", "MAX", "'My Sheet'!C1"]);
    assert_eq!(child(&root, 1).children.len(), 2);
    assert_eq!(child(&root, 2).kind, NodeKind::Reference);
}

#[test]
fn test_function_followed_by_operator() {
    let root = parse("=SUM(A1:A3)/COUNT(A1:A3)");
    assert_eq!(root.text, "/");
    assert_eq!(child(&root, 0).kind, NodeKind::Function);
    assert_eq!(child(&root, 1).text, "COUNT");
}

#[test]
fn test_literals() {
    assert_eq!(parse("=TRUE").kind, NodeKind::Literal);
    assert_eq!(parse("=false").kind, NodeKind::Literal);
    assert_eq!(parse("=\"text\"").kind, NodeKind::Literal);
    assert_eq!(parse("=-2.5e-3").kind, NodeKind::Literal);
    assert_eq!(parse("=#N/A").kind, NodeKind::Literal);
}

#[test]
fn test_xlfn_prefixed_function() {
    let root = parse("=_xlfn.XLOOKUP(A1,B1:B9,C1:C9)");
    assert_eq!(root.kind, NodeKind::Function);
    assert_eq!(root.text, "_xlfn.XLOOKUP");
    assert_eq!(root.children.len(), 3);
}

#[test]
fn test_if_true_condition_activates_true_branch() {
    let mut root = parse("=IF(A1>0,B1,C1)");
    assert!(annotate_branches(&mut root, &[CellValue::Bool(true)]));
    assert_eq!(child(&root, 0).is_active_branch, None);
    assert_eq!(child(&root, 1).is_active_branch, Some(true));
    assert_eq!(child(&root, 2).is_active_branch, Some(false));
}

#[test]
fn test_if_without_false_branch() {
    let mut root = parse("=IF(A1,B1)");
    annotate_branches(&mut root, &[CellValue::Int(0)]);
    assert_eq!(child(&root, 1).is_active_branch, Some(false));
    assert_eq!(root.children.len(), 2);
}

#[test]
fn test_tree_serializes_without_empty_fields() {
    let json = serde_json::to_value(parse("=A1+1")).expect("serialize");
    assert_eq!(json["kind"], "operator");
    assert_eq!(json["children"][0]["reference_address"], "A1");
    assert!(json["children"][1].get("children").is_none());
    assert!(json.get("is_active_branch").is_none());
}

#[test]
fn test_non_ascii_operand_before_sign() {
    let root = parse("=Größe-1");
    assert_eq!(root.kind, NodeKind::Operator);
    assert_eq!(root.text, "-");
    assert_eq!(child(&root, 0).text, "Größe");
    assert_eq!(child(&root, 1).text, "1");

    let root = parse("=𝔸1+1");
    assert_eq!(root.text, "+");
    assert_eq!(child(&root, 1).text, "1");
}

//! Annotation passes over parsed trees: which branch of a logical function
//! was taken, and where a lookup function points.

use serde::{Deserialize, Serialize};

use cellscope_primitives::CellValue;

use crate::parser::FormulaNode;

/// Functions that get branch or target annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunctionKind {
    If,
    Ifs,
    Choose,
    Switch,
    Vlookup,
    Hlookup,
    Index,
    Offset,
    Indirect,
}

impl FunctionKind {
    /// Case-insensitive lookup; the `_xlfn.` prefix newer functions carry is ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("_XLFN.").unwrap_or(&upper);
        match bare {
            "IF" => Some(FunctionKind::If),
            "IFS" => Some(FunctionKind::Ifs),
            "CHOOSE" => Some(FunctionKind::Choose),
            "SWITCH" => Some(FunctionKind::Switch),
            "VLOOKUP" => Some(FunctionKind::Vlookup),
            "HLOOKUP" => Some(FunctionKind::Hlookup),
            "INDEX" => Some(FunctionKind::Index),
            "OFFSET" => Some(FunctionKind::Offset),
            "INDIRECT" => Some(FunctionKind::Indirect),
            _ => None,
        }
    }

    pub fn is_branching(&self) -> bool {
        matches!(
            self,
            FunctionKind::If | FunctionKind::Ifs | FunctionKind::Choose | FunctionKind::Switch
        )
    }
}

fn arg(node: &FormulaNode, index: usize) -> Option<&str> {
    node.children
        .get(index)
        .map(|child| child.source.trim())
        .filter(|text| !text.is_empty())
}

/// Descriptive label for lookup/reference functions. Not a resolved address.
pub fn target_location_label(node: &FormulaNode) -> Option<String> {
    let kind = node.function_kind()?;
    let missing = "?";
    match kind {
        FunctionKind::Vlookup | FunctionKind::Hlookup => Some(format!(
            "{} (column {})",
            arg(node, 1).unwrap_or(missing),
            arg(node, 2).unwrap_or(missing)
        )),
        FunctionKind::Index => Some(format!(
            "{} (row {}, col {})",
            arg(node, 0).unwrap_or(missing),
            arg(node, 1).unwrap_or(missing),
            arg(node, 2).unwrap_or("1")
        )),
        FunctionKind::Offset => Some(format!(
            "{} offset by ({}, {})",
            arg(node, 0).unwrap_or(missing),
            arg(node, 1).unwrap_or("0"),
            arg(node, 2).unwrap_or("0")
        )),
        FunctionKind::Indirect => Some(format!("Indirect: {}", arg(node, 0).unwrap_or(missing))),
        _ => None,
    }
}

/// Mark the taken branch of an IF/IFS/CHOOSE/SWITCH node.
///
/// `args` are the evaluated argument values, positionally; missing values
/// count as empty. Returns `false` and leaves the node untouched when it is
/// not a branching function.
pub fn annotate_branches(node: &mut FormulaNode, args: &[CellValue]) -> bool {
    let Some(kind) = node.function_kind().filter(FunctionKind::is_branching) else {
        return false;
    };
    let value = |index: usize| args.get(index).cloned().unwrap_or_default();
    let children = &mut node.children;

    match kind {
        FunctionKind::If => {
            let taken = value(0).is_truthy();
            if let Some(child) = children.get_mut(1) {
                child.is_active_branch = Some(taken);
            }
            if let Some(child) = children.get_mut(2) {
                child.is_active_branch = Some(!taken);
            }
        }
        FunctionKind::Ifs => {
            for child in children.iter_mut() {
                child.is_active_branch = Some(false);
            }
            let pairs = children.len() / 2;
            if let Some(pair) = (0..pairs).find(|pair| value(pair * 2).is_truthy()) {
                children[pair * 2].is_active_branch = Some(true);
                children[pair * 2 + 1].is_active_branch = Some(true);
            }
        }
        FunctionKind::Choose => {
            for child in children.iter_mut().skip(1) {
                child.is_active_branch = Some(false);
            }
            if let Some(index) = value(0).as_number().map(f64::floor) {
                if index >= 1.0 && index < children.len() as f64 {
                    children[index as usize].is_active_branch = Some(true);
                }
            }
        }
        FunctionKind::Switch => {
            for child in children.iter_mut().skip(1) {
                child.is_active_branch = Some(false);
            }
            let subject = value(0);
            let count = children.len();
            let matched = (1..count)
                .step_by(2)
                .filter(|case| case + 1 < count)
                .find(|case| subject.matches(&value(*case)));
            match matched {
                Some(case) => {
                    children[case].is_active_branch = Some(true);
                    children[case + 1].is_active_branch = Some(true);
                }
                None if count >= 2 && count % 2 == 0 => {
                    children[count - 1].is_active_branch = Some(true);
                }
                None => {}
            }
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn flags(node: &FormulaNode) -> Vec<Option<bool>> {
        node.children.iter().map(|c| c.is_active_branch).collect()
    }

    #[test]
    fn test_function_kind_from_name() {
        assert_eq!(FunctionKind::from_name("vlookup"), Some(FunctionKind::Vlookup));
        assert_eq!(FunctionKind::from_name("_xlfn.IFS"), Some(FunctionKind::Ifs));
        assert_eq!(FunctionKind::from_name("SUM"), None);
    }

    #[test]
    fn test_if_false_condition() {
        let mut node = parse("=IF(A1>0,B1,C1)");
        assert!(annotate_branches(&mut node, &[CellValue::Bool(false)]));
        assert_eq!(flags(&node), vec![None, Some(false), Some(true)]);
    }

    #[test]
    fn test_ifs_first_truthy_pair() {
        let mut node = parse("=IFS(A1>10,\"high\",A1>5,\"mid\",TRUE,\"low\")");
        let args = [
            CellValue::Bool(false),
            CellValue::Null,
            CellValue::Bool(true),
            CellValue::Null,
            CellValue::Bool(true),
        ];
        annotate_branches(&mut node, &args);
        assert_eq!(
            flags(&node),
            vec![
                Some(false),
                Some(false),
                Some(true),
                Some(true),
                Some(false),
                Some(false)
            ]
        );
    }

    #[test]
    fn test_choose_floor_index() {
        let mut node = parse("=CHOOSE(A1,\"a\",\"b\",\"c\")");
        annotate_branches(&mut node, &[CellValue::Float(2.7)]);
        assert_eq!(flags(&node), vec![None, Some(false), Some(true), Some(false)]);

        let mut node = parse("=CHOOSE(A1,\"a\",\"b\")");
        annotate_branches(&mut node, &[CellValue::Int(9)]);
        assert_eq!(flags(&node), vec![None, Some(false), Some(false)]);
    }

    #[test]
    fn test_switch_match_and_default() {
        let cases = |subject: i64| {
            [
                CellValue::Int(subject),
                CellValue::Int(1),
                CellValue::Null,
                CellValue::Int(2),
            ]
        };
        let mut node = parse("=SWITCH(A1,1,\"one\",2,\"two\",\"other\")");
        annotate_branches(&mut node, &cases(2));
        assert_eq!(
            flags(&node),
            vec![None, Some(false), Some(false), Some(true), Some(true), Some(false)]
        );

        let mut node = parse("=SWITCH(A1,1,\"one\",2,\"two\",\"other\")");
        annotate_branches(&mut node, &cases(7));
        assert_eq!(flags(&node).last(), Some(&Some(true)));
    }

    #[test]
    fn test_non_branching_untouched() {
        let mut node = parse("=SUM(A1,B1)");
        assert!(!annotate_branches(&mut node, &[CellValue::Bool(true)]));
        assert!(flags(&node).iter().all(Option::is_none));
    }

    #[test]
    fn test_target_labels() {
        let node = parse("=VLOOKUP(A1,Rates!A1:C10,3,FALSE)");
        assert_eq!(
            node.target_location_label.as_deref(),
            Some("Rates!A1:C10 (column 3)")
        );
        let node = parse("=INDEX(B2:D9,4)");
        assert_eq!(
            node.target_location_label.as_deref(),
            Some("B2:D9 (row 4, col 1)")
        );
        let node = parse("=OFFSET(A1,2,)");
        assert_eq!(
            node.target_location_label.as_deref(),
            Some("A1 offset by (2, 0)")
        );
        let node = parse("=INDIRECT(\"Sheet2!B\"&C1)");
        assert_eq!(
            node.target_location_label.as_deref(),
            Some("Indirect: \"Sheet2!B\"&C1")
        );
        assert_eq!(parse("=IF(A1,1,2)").target_location_label, None);
    }
}

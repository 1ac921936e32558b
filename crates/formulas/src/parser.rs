//! Formula parser module
//!
//! Builds an owned expression tree from formula text by recursive splitting:
//! function calls first, then bare references and literals, then the
//! lowest-precedence top-level binary operator. Broken input never fails;
//! whatever cannot be split is kept as a literal node so it stays inspectable.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::annotate::{target_location_label, FunctionKind};
use crate::refs::is_reference;
use crate::utils::{find_matching_close, skip_quoted, split_top_level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Function,
    Reference,
    Operator,
    Literal,
    Array,
}

/// A node of a parsed formula. Each node owns its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaNode {
    pub kind: NodeKind,
    /// Function name, operator symbol, reference token or literal text.
    pub text: String,
    /// The sub-expression this node was parsed from.
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FormulaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active_branch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_location_label: Option<String>,
}

impl FormulaNode {
    fn leaf(kind: NodeKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            source: text.to_string(),
            children: Vec::new(),
            reference_address: None,
            is_active_branch: None,
            target_location_label: None,
        }
    }

    pub fn literal(text: &str) -> Self {
        Self::leaf(NodeKind::Literal, text)
    }

    pub fn reference(text: &str) -> Self {
        let mut node = Self::leaf(NodeKind::Reference, text);
        node.reference_address = Some(text.to_string());
        node
    }

    fn operator(symbol: &str, source: &str, children: Vec<FormulaNode>) -> Self {
        let mut node = Self::leaf(NodeKind::Operator, symbol);
        node.source = source.to_string();
        node.children = children;
        node
    }

    /// Closed function kind for function nodes with special handling.
    pub fn function_kind(&self) -> Option<FunctionKind> {
        match self.kind {
            NodeKind::Function => FunctionKind::from_name(&self.text),
            _ => None,
        }
    }

    /// All reference nodes in the subtree, left to right.
    pub fn references(&self) -> Vec<&FormulaNode> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a FormulaNode>) {
        if self.kind == NodeKind::Reference {
            out.push(self);
        }
        for child in &self.children {
            child.collect_references(out);
        }
    }

    /// Indented tree rendering, one node per line.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let kind = match self.kind {
            NodeKind::Function => "fn",
            NodeKind::Reference => "ref",
            NodeKind::Operator => "op",
            NodeKind::Literal => "lit",
            NodeKind::Array => "array",
        };
        let _ = write!(out, "{}{} {}", "  ".repeat(depth), kind, self.text);
        match self.is_active_branch {
            Some(true) => out.push_str(" [active]"),
            Some(false) => out.push_str(" [inactive]"),
            None => {}
        }
        if let Some(label) = &self.target_location_label {
            let _ = write!(out, " -> {label}");
        }
        out.push('\n');
        for child in &self.children {
            child.write_pretty(out, depth + 1);
        }
    }
}

/// Parse formula text into an expression tree.
///
/// Text without a leading `=` is a constant cell and comes back as a single
/// literal node wrapping the raw text.
pub fn parse(formula: &str) -> FormulaNode {
    match formula.trim_start().strip_prefix('=') {
        Some(body) => parse_expression(body),
        None => FormulaNode::literal(formula),
    }
}

fn parse_expression(expr: &str) -> FormulaNode {
    let expr = expr.trim();
    if expr.is_empty() {
        return FormulaNode::literal("");
    }

    if expr.starts_with('(') && find_matching_close(expr, 0) == Some(expr.len() - 1) {
        return parse_expression(&expr[1..expr.len() - 1]);
    }

    if let Some(head) = function_head_regex().find(expr) {
        let open = head.end() - 1;
        match find_matching_close(expr, open) {
            None => return FormulaNode::literal(expr),
            Some(close) if close == expr.len() - 1 => {
                return parse_function(&expr[..open], &expr[open + 1..close], expr);
            }
            Some(_) => {}
        }
    }

    if is_reference(expr) {
        return FormulaNode::reference(expr);
    }

    if is_literal(expr) {
        return FormulaNode::literal(expr);
    }

    if expr.starts_with('{') && find_matching_close(expr, 0) == Some(expr.len() - 1) {
        let mut node = FormulaNode::leaf(NodeKind::Array, expr);
        node.children = split_top_level(&expr[1..expr.len() - 1], &[',', ';'])
            .into_iter()
            .map(parse_expression)
            .collect();
        return node;
    }

    if let Some((position, symbol)) = split_point(expr) {
        let left = parse_expression(&expr[..position]);
        let right = parse_expression(&expr[position + symbol.len()..]);
        return FormulaNode::operator(symbol, expr, vec![left, right]);
    }

    if let Some(operand) = expr.strip_prefix('-').or_else(|| expr.strip_prefix('+')) {
        let symbol = &expr[..1];
        return FormulaNode::operator(symbol, expr, vec![parse_expression(operand)]);
    }

    if let Some(operand) = expr.strip_suffix('%') {
        return FormulaNode::operator("%", expr, vec![parse_expression(operand)]);
    }

    FormulaNode::literal(expr)
}

fn parse_function(name: &str, inner: &str, source: &str) -> FormulaNode {
    let mut node = FormulaNode::leaf(NodeKind::Function, name);
    node.source = source.to_string();
    if !inner.trim().is_empty() {
        node.children = split_top_level(inner, &[','])
            .into_iter()
            .map(parse_expression)
            .collect();
    }
    node.target_location_label = target_location_label(&node);
    node
}

const ERROR_LITERALS: [&str; 10] = [
    "#NULL!",
    "#DIV/0!",
    "#VALUE!",
    "#REF!",
    "#NAME?",
    "#NUM!",
    "#N/A",
    "#SPILL!",
    "#CALC!",
    "#GETTING_DATA",
];

fn error_literal_at(text: &str) -> Option<&'static str> {
    ERROR_LITERALS.into_iter().find(|error| {
        text.len() >= error.len()
            && text.is_char_boundary(error.len())
            && text[..error.len()].eq_ignore_ascii_case(error)
    })
}

fn is_literal(expr: &str) -> bool {
    if number_regex().is_match(expr) {
        return true;
    }
    if expr.starts_with('"') && skip_quoted(expr, 0) == expr.len() && expr.len() > 1 {
        return true;
    }
    if expr.eq_ignore_ascii_case("TRUE") || expr.eq_ignore_ascii_case("FALSE") {
        return true;
    }
    error_literal_at(expr).is_some_and(|error| error.len() == expr.len())
}

const PRECEDENCE_TIERS: [&[&str]; 5] = [
    &["=", "<>", "<=", ">=", "<", ">"],
    &["&"],
    &["+", "-"],
    &["*", "/"],
    &["^"],
];

/// Rightmost operator of the lowest-precedence tier present at depth zero.
fn split_point(expr: &str) -> Option<(usize, &'static str)> {
    let operators = top_level_operators(expr);
    PRECEDENCE_TIERS.iter().find_map(|tier| {
        operators
            .iter()
            .rev()
            .find(|(_, symbol)| tier.contains(symbol))
            .copied()
    })
}

fn top_level_operators(expr: &str) -> Vec<(usize, &'static str)> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut prev: Option<char> = None;
    let mut idx = 0;

    while idx < expr.len() {
        let Some(ch) = expr[idx..].chars().next() else {
            break;
        };

        if ch == '"' || ch == '\'' {
            idx = skip_quoted(expr, idx);
            prev = Some(ch);
            continue;
        }
        if ch == '#' {
            if let Some(error) = error_literal_at(&expr[idx..]) {
                idx += error.len();
                prev = Some('!');
                continue;
            }
        }

        match ch {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            '<' | '>' => {
                let two = match (ch, expr[idx + 1..].chars().next()) {
                    ('<', Some('>')) => Some("<>"),
                    ('<', Some('=')) => Some("<="),
                    ('>', Some('=')) => Some(">="),
                    _ => None,
                };
                if let Some(symbol) = two {
                    found.push((idx, symbol));
                    idx += 2;
                    prev = Some('=');
                    continue;
                }
                found.push((idx, if ch == '<' { "<" } else { ">" }));
            }
            '=' => found.push((idx, "=")),
            '&' => found.push((idx, "&")),
            '*' => found.push((idx, "*")),
            '/' => found.push((idx, "/")),
            '^' => found.push((idx, "^")),
            '+' | '-' => {
                let binary =
                    prev.is_some_and(ends_operand) && !is_exponent_sign(&expr[..idx]);
                if binary {
                    found.push((idx, if ch == '+' { "+" } else { "-" }));
                }
            }
            _ => {}
        }

        if !ch.is_whitespace() {
            prev = Some(ch);
        }
        idx += ch.len_utf8();
    }

    found
}

fn ends_operand(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, ')' | '}' | ']' | '"' | '\'' | '%' | '_' | '.' | '!' | '$')
}

/// `1E+3`: the sign belongs to the number when the text before it is a mantissa plus `E`.
fn is_exponent_sign(before: &str) -> bool {
    let start = before
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '.'))
        .map_or(0, |(pos, c)| pos + c.len_utf8());
    mantissa_regex().is_match(&before[start..])
}

fn function_head_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*\(").expect("valid regex"))
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?%?$").expect("valid regex")
    })
}

fn mantissa_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+\.?\d*|\.\d+)[eE]$").expect("valid regex"))
}

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use cellscope_primitives::address::{
    column_letters_to_number, normalize_address, parse_range, unquote_sheet_name,
};
use cellscope_primitives::{CellAddress, CellRange};

use crate::utils::skip_quoted;
use crate::FormulaError;

/// Placeholder substituted for every reference by [`normalize_formula`].
pub const REFERENCE_PLACEHOLDER: &str = "REF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Cell,
    Range,
    ColumnRange,
    RowRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    Relative,
    Absolute,
    Mixed,
}

/// A reference token as written in formula text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaReference {
    /// Full token text, qualifiers included (`'[Book1]My Sheet'!$A$1`).
    pub text: String,
    pub workbook: Option<String>,
    pub sheet: Option<String>,
    /// Address part as written, without qualifiers (`$A$1`, `A1:B10`, `C:C`).
    pub address: String,
    pub kind: ReferenceKind,
    pub mode: ReferenceMode,
    /// Byte offset of the token in the scanned text.
    pub start: usize,
}

impl FormulaReference {
    /// Byte offset just past the token.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Resolve against the sheet owning the formula.
    pub fn resolve(&self, default_sheet: &str) -> CellReference {
        CellReference {
            workbook: self.workbook.clone(),
            sheet: self
                .sheet
                .clone()
                .unwrap_or_else(|| default_sheet.to_string()),
            address: normalize_address(&self.address),
        }
    }
}

/// Resolved pointer to a cell or range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workbook: Option<String>,
    pub sheet: String,
    /// Normalized address (`$` stripped, upper-cased).
    pub address: String,
}

impl CellReference {
    pub fn new(sheet: impl Into<String>, address: &str) -> Self {
        Self {
            workbook: None,
            sheet: sheet.into(),
            address: normalize_address(address),
        }
    }

    /// Fully-qualified key: `Sheet!A1`, or `[Book]Sheet!A1` for external workbooks.
    pub fn qualified(&self) -> String {
        match &self.workbook {
            Some(book) => format!("[{}]{}!{}", book, self.sheet, self.address),
            None => format!("{}!{}", self.sheet, self.address),
        }
    }

    pub fn is_range(&self) -> bool {
        self.address.contains(':')
    }

    /// Rectangular bounds of the address.
    pub fn bounds(&self) -> Result<CellRange, FormulaError> {
        Ok(parse_range(&self.address)?)
    }

    /// Parse a key produced by [`CellReference::qualified`].
    ///
    /// Keys carry unquoted sheet names, so the sheet is everything before the
    /// last `!` (after an optional `[Book]` tag); quoted names are accepted too.
    pub fn from_qualified(key: &str) -> Result<Self, FormulaError> {
        let invalid = || FormulaError::InvalidAddress(key.to_string());
        let (workbook, rest) = match key.strip_prefix('[').and_then(|r| r.split_once(']')) {
            Some((book, rest)) => (Some(book.to_string()), rest),
            None => (None, key),
        };
        let (sheet, address) = rest.rsplit_once('!').ok_or_else(invalid)?;
        if sheet.is_empty() {
            return Err(invalid());
        }
        parse_range(address).map_err(|_| invalid())?;
        Ok(CellReference {
            workbook,
            sheet: unquote_sheet_name(sheet),
            address: normalize_address(address),
        })
    }
}

/// Extract every reference token from formula text, in order of appearance.
///
/// Text inside string literals is skipped, as are identifiers that only look
/// like references (function names such as `LOG10(`).
pub fn extract_references(formula: &str) -> Vec<FormulaReference> {
    let mut refs = Vec::new();
    let mut idx = 0;
    let mut prev: Option<char> = None;

    while idx < formula.len() {
        let Some(ch) = formula[idx..].chars().next() else {
            break;
        };

        if ch == '"' {
            idx = skip_quoted(formula, idx);
            prev = Some('"');
            continue;
        }

        let at_boundary = prev.map_or(true, |p| !blocks_reference_start(p));
        if at_boundary && may_start_reference(ch) {
            if let Some(reference) = scan_token(formula, idx) {
                idx = reference.end();
                prev = reference.text.chars().last();
                refs.push(reference);
                continue;
            }
        }

        if is_word_char(ch) {
            let word_end = formula[idx..]
                .char_indices()
                .find(|(_, c)| !is_word_char(*c))
                .map_or(formula.len(), |(offset, _)| idx + offset);
            prev = formula[idx..word_end].chars().last();
            idx = word_end;
        } else {
            prev = Some(ch);
            idx += ch.len_utf8();
        }
    }

    refs
}

/// Parse one reference token (e.g. `Sheet2!$A$1`, `'[Book1]Q1 Data'!B:B`).
/// Unqualified tokens resolve to `default_sheet`.
pub fn parse_reference(token: &str, default_sheet: &str) -> Result<CellReference, FormulaError> {
    let token = token.trim();
    scan_token(token, 0)
        .filter(|reference| reference.text.len() == token.len())
        .map(|reference| reference.resolve(default_sheet))
        .ok_or_else(|| FormulaError::InvalidAddress(token.to_string()))
}

/// Whether the entire text is a single reference token.
pub fn is_reference(text: &str) -> bool {
    scan_token(text, 0).is_some_and(|reference| reference.text.len() == text.len())
}

/// Replace every reference token with [`REFERENCE_PLACEHOLDER`].
///
/// Two formulas that differ only in which cells they point to normalize to
/// the same text (`=B1+B2` and `=B1+B3` both become `=REF+REF`).
pub fn normalize_formula(formula: &str) -> String {
    replace_references(formula, |_| REFERENCE_PLACEHOLDER.to_string())
}

/// Rewrite references as R1C1-style offsets from `origin`.
///
/// Relative parts become bracketed offsets, `$`-anchored parts stay absolute,
/// so a formula filled down or across keeps the same signature.
pub fn relative_signature(formula: &str, origin: CellAddress) -> String {
    replace_references(formula, |reference| {
        let prefix = &reference.text[..reference.text.len() - reference.address.len()];
        let body = match reference.kind {
            ReferenceKind::Cell | ReferenceKind::Range => reference
                .address
                .split(':')
                .map(|part| relative_cell(part, origin))
                .collect::<Vec<_>>()
                .join(":"),
            ReferenceKind::ColumnRange => reference
                .address
                .split(':')
                .map(|part| relative_column(part, origin))
                .collect::<Vec<_>>()
                .join(":"),
            ReferenceKind::RowRange => reference
                .address
                .split(':')
                .map(|part| relative_row(part, origin))
                .collect::<Vec<_>>()
                .join(":"),
        };
        format!("{}{}", prefix.to_ascii_uppercase(), body)
    })
}

fn replace_references(formula: &str, replace: impl Fn(&FormulaReference) -> String) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut last = 0;
    for reference in extract_references(formula) {
        out.push_str(&formula[last..reference.start]);
        out.push_str(&replace(&reference));
        last = reference.end();
    }
    out.push_str(&formula[last..]);
    out
}

fn relative_cell(part: &str, origin: CellAddress) -> String {
    let Some(caps) = a1_cell_regex().captures(part) else {
        return part.to_string();
    };
    let abs_col = !caps[1].is_empty();
    let abs_row = !caps[3].is_empty();
    let col = column_letters_to_number(&caps[2]).unwrap_or(1);
    let row = caps[4].parse::<u32>().unwrap_or(1);
    format!(
        "{}{}",
        axis("R", row, origin.row, abs_row),
        axis("C", col, origin.col, abs_col)
    )
}

fn relative_column(part: &str, origin: CellAddress) -> String {
    let absolute = part.starts_with('$');
    let col = column_letters_to_number(part.trim_start_matches('$')).unwrap_or(1);
    axis("C", col, origin.col, absolute)
}

fn relative_row(part: &str, origin: CellAddress) -> String {
    let absolute = part.starts_with('$');
    let row = part.trim_start_matches('$').parse::<u32>().unwrap_or(1);
    axis("R", row, origin.row, absolute)
}

fn axis(label: &str, value: u32, origin: u32, absolute: bool) -> String {
    if absolute {
        format!("{label}{value}")
    } else {
        format!("{label}[{}]", i64::from(value) - i64::from(origin))
    }
}

/// Try to read one reference token starting at byte `start`.
fn scan_token(text: &str, start: usize) -> Option<FormulaReference> {
    let rest = &text[start..];
    let caps = token_regex().captures(rest)?;
    let whole = caps.get(0)?;
    let end = start + whole.end();

    if let Some(next) = text[end..].chars().next() {
        if is_word_char(next) || matches!(next, '(' | '$' | '!' | '[') {
            return None;
        }
    }

    let address = caps.name("addr")?.as_str().to_string();
    let (workbook, sheet) = qualifiers(&caps);
    let kind = if caps.name("cell_end").is_some() {
        ReferenceKind::Range
    } else if caps.name("cell").is_some() {
        ReferenceKind::Cell
    } else if caps.name("cols").is_some() {
        ReferenceKind::ColumnRange
    } else {
        ReferenceKind::RowRange
    };

    Some(FormulaReference {
        text: whole.as_str().to_string(),
        workbook,
        sheet,
        mode: mode_of(&address, kind),
        address,
        kind,
        start,
    })
}

fn qualifiers(caps: &Captures<'_>) -> (Option<String>, Option<String>) {
    let mut workbook = caps.name("book").map(|m| m.as_str().to_string());
    let Some(raw_sheet) = caps.name("sheet").map(|m| unquote_sheet_name(m.as_str())) else {
        return (workbook, None);
    };

    // '[Book1]Sheet 1' or 'C:\dir\[Book1]Sheet 1' keep the workbook inside the quotes.
    let sheet = match (raw_sheet.find('['), raw_sheet.rfind(']')) {
        (Some(open), Some(close)) if open < close => {
            workbook = Some(raw_sheet[open + 1..close].to_string());
            raw_sheet[close + 1..].to_string()
        }
        _ => raw_sheet,
    };
    (workbook, Some(sheet))
}

fn mode_of(address: &str, kind: ReferenceKind) -> ReferenceMode {
    let anchors = address.matches('$').count();
    let possible = match kind {
        ReferenceKind::Cell | ReferenceKind::ColumnRange | ReferenceKind::RowRange => 2,
        ReferenceKind::Range => 4,
    };
    match anchors {
        0 => ReferenceMode::Relative,
        n if n >= possible => ReferenceMode::Absolute,
        _ => ReferenceMode::Mixed,
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

fn blocks_reference_start(prev: char) -> bool {
    is_word_char(prev) || matches!(prev, '$' | '#' | '!' | ']' | ':')
}

fn may_start_reference(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '$' | '\'' | '[' | '_')
}

fn token_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:\[(?P<book>[^\]]+)\])?",
            r"(?:(?P<sheet>'(?:[^']|'')+'|[A-Za-z0-9_.]+)!)?",
            r"(?P<addr>",
            r"(?P<cell>\$?[A-Za-z]{1,3}\$?[0-9]+)(?::(?P<cell_end>\$?[A-Za-z]{1,3}\$?[0-9]+))?",
            r"|(?P<cols>\$?[A-Za-z]{1,3}:\$?[A-Za-z]{1,3})",
            r"|(?P<rows>\$?[0-9]+:\$?[0-9]+)",
            r")"
        ))
        .expect("valid regex")
    })
}

fn a1_cell_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\$?)([A-Za-z]+)(\$?)(\d+)$").expect("valid regex"))
}

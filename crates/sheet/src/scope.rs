//! Scope descriptors: the region a dependency analysis covers.

use serde::{Deserialize, Serialize};
use std::fmt;

use cellscope_formulas::CellReference;
use cellscope_primitives::{parse_range, split_sheet_prefix, CellAddress, CellRange};

use crate::error::{Result, SheetError};
use crate::provider::{same_sheet_name, CellFormulaProvider};

/// Whole workbook, one worksheet, or one rectangular range.
///
/// A focus area for inflow/outflow analysis uses the same shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scope {
    /// The listed sheets; an empty list means every sheet the provider has
    Workbook { sheets: Vec<String> },
    Sheet { name: String },
    Range { sheet: String, range: CellRange },
}

impl Scope {
    pub fn workbook() -> Self {
        Scope::Workbook { sheets: Vec::new() }
    }

    pub fn sheet(name: impl Into<String>) -> Self {
        Scope::Sheet { name: name.into() }
    }

    /// Range scope from an A1 range string
    pub fn range(sheet: impl Into<String>, address: &str) -> Result<Self> {
        let sheet = sheet.into();
        let range = parse_range(address).map_err(|err| SheetError::InvalidScope {
            scope: format!("{sheet}!{address}"),
            reason: err.to_string(),
        })?;
        Ok(Scope::Range { sheet, range })
    }

    /// Parse `*` (workbook), `Sheet1,Sheet2` (listed sheets), `Sheet1`
    /// (worksheet), or `Sheet1!A1:C10` / `'My Sheet'!B2` (range).
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SheetError::InvalidScope {
                scope: text.to_string(),
                reason: "empty scope".to_string(),
            });
        }
        if text == "*" {
            return Ok(Scope::workbook());
        }
        if text.contains('!') {
            let (sheet, address) = split_sheet_prefix(text);
            let sheet = sheet.filter(|s| !s.is_empty()).ok_or_else(|| SheetError::InvalidScope {
                scope: text.to_string(),
                reason: "missing sheet name".to_string(),
            })?;
            return Scope::range(sheet, address);
        }
        if text.contains(',') {
            let sheets = text
                .split(',')
                .map(|name| name.trim().trim_matches('\'').to_string())
                .filter(|name| !name.is_empty())
                .collect();
            return Ok(Scope::Workbook { sheets });
        }
        Ok(Scope::sheet(text.trim_matches('\'')))
    }

    /// Resolve sheet names against the provider before any scan begins.
    ///
    /// Returns a copy with canonical sheet spellings and the workbook list
    /// filled in. A missing sheet is a `SheetNotFound` error.
    pub fn validate(&self, provider: &dyn CellFormulaProvider) -> Result<Scope> {
        let canonical = |name: &str| {
            provider
                .canonical_sheet_name(name)
                .ok_or_else(|| SheetError::SheetNotFound {
                    name: name.to_string(),
                })
        };
        Ok(match self {
            Scope::Workbook { sheets } if sheets.is_empty() => Scope::Workbook {
                sheets: provider.sheet_names(),
            },
            Scope::Workbook { sheets } => Scope::Workbook {
                sheets: sheets
                    .iter()
                    .map(|name| canonical(name))
                    .collect::<Result<Vec<_>>>()?,
            },
            Scope::Sheet { name } => Scope::Sheet {
                name: canonical(name)?,
            },
            Scope::Range { sheet, range } => Scope::Range {
                sheet: canonical(sheet)?,
                range: range.normalized(),
            },
        })
    }

    /// Sheets the scope touches
    pub fn sheets(&self) -> Vec<&str> {
        match self {
            Scope::Workbook { sheets } => sheets.iter().map(String::as_str).collect(),
            Scope::Sheet { name } => vec![name.as_str()],
            Scope::Range { sheet, .. } => vec![sheet.as_str()],
        }
    }

    fn covers_sheet(&self, sheet: &str) -> bool {
        match self {
            Scope::Workbook { sheets } => {
                sheets.is_empty() || sheets.iter().any(|s| same_sheet_name(s, sheet))
            }
            Scope::Sheet { name } => same_sheet_name(name, sheet),
            Scope::Range { sheet: own, .. } => same_sheet_name(own, sheet),
        }
    }

    /// Whether a single cell lies in scope
    pub fn contains(&self, sheet: &str, cell: CellAddress) -> bool {
        if !self.covers_sheet(sheet) {
            return false;
        }
        match self {
            Scope::Range { range, .. } => range.contains(&cell),
            _ => true,
        }
    }

    /// Whether a resolved reference lies entirely in scope.
    ///
    /// References into another workbook never do; a range reference must fit
    /// inside a range scope as a whole.
    pub fn contains_reference(&self, reference: &CellReference) -> bool {
        if reference.workbook.is_some() || !self.covers_sheet(&reference.sheet) {
            return false;
        }
        match self {
            Scope::Range { range, .. } => reference
                .bounds()
                .is_ok_and(|bounds| range.contains_range(&bounds)),
            _ => reference.bounds().is_ok(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Workbook { sheets } if sheets.is_empty() => write!(f, "*"),
            Scope::Workbook { sheets } => write!(f, "{}", sheets.join(",")),
            Scope::Sheet { name } => write!(f, "{name}"),
            Scope::Range { sheet, range } => write!(f, "{}!{}", quote_sheet_name(sheet), range),
        }
    }
}

fn quote_sheet_name(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

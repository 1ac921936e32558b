//! Highlight colors exchanged with the host as `#RRGGBB` strings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::{AddressError, Result};

/// Categories a cell can be highlighted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightCategory {
    Input,
    Calculation,
    Output,
    Orphan,
    Inflow,
    Outflow,
    OutsidePrecedent,
    OutsideDependent,
    Difference,
}

impl HighlightCategory {
    pub const ALL: [HighlightCategory; 9] = [
        HighlightCategory::Input,
        HighlightCategory::Calculation,
        HighlightCategory::Output,
        HighlightCategory::Orphan,
        HighlightCategory::Inflow,
        HighlightCategory::Outflow,
        HighlightCategory::OutsidePrecedent,
        HighlightCategory::OutsideDependent,
        HighlightCategory::Difference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightCategory::Input => "input",
            HighlightCategory::Calculation => "calculation",
            HighlightCategory::Output => "output",
            HighlightCategory::Orphan => "orphan",
            HighlightCategory::Inflow => "inflow",
            HighlightCategory::Outflow => "outflow",
            HighlightCategory::OutsidePrecedent => "outside_precedent",
            HighlightCategory::OutsideDependent => "outside_dependent",
            HighlightCategory::Difference => "difference",
        }
    }

    fn default_color(&self) -> &'static str {
        match self {
            HighlightCategory::Input => "#C6EFCE",
            HighlightCategory::Calculation => "#FFEB9C",
            HighlightCategory::Output => "#BDD7EE",
            HighlightCategory::Orphan => "#D9D9D9",
            HighlightCategory::Inflow => "#F8CBAD",
            HighlightCategory::Outflow => "#E4DFEC",
            HighlightCategory::OutsidePrecedent => "#FCE4D6",
            HighlightCategory::OutsideDependent => "#DDEBF7",
            HighlightCategory::Difference => "#FFC7CE",
        }
    }
}

impl fmt::Display for HighlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightCategory {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        HighlightCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| AddressError::InvalidColor {
                category: s.to_string(),
                value: "unknown category".to_string(),
            })
    }
}

const DEFAULT_PATTERN_COLORS: [&str; 8] = [
    "#FFD966", "#9BC2E6", "#A9D08E", "#F4B084", "#C9A0DC", "#8EA9DB", "#FF9999", "#B4C6E7",
];

/// Colors per category plus the cycle used for formula pattern maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: BTreeMap<HighlightCategory, String>,
    pattern_colors: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: HighlightCategory::ALL
                .into_iter()
                .map(|category| (category, category.default_color().to_string()))
                .collect(),
            pattern_colors: DEFAULT_PATTERN_COLORS
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        }
    }
}

impl Palette {
    /// Default palette with caller overrides keyed by category name.
    ///
    /// The key `pattern` replaces the pattern cycle with a comma-separated list.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self> {
        let mut palette = Self::default();
        for (name, value) in overrides {
            palette.set(name, value)?;
        }
        Ok(palette)
    }

    /// Override one category (or the pattern cycle) by name.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        if name.trim().eq_ignore_ascii_case("pattern") {
            let colors = value
                .split(',')
                .map(|c| validate_hex(name, c.trim()))
                .collect::<Result<Vec<_>>>()?;
            if colors.is_empty() {
                return Err(AddressError::InvalidColor {
                    category: name.to_string(),
                    value: value.to_string(),
                });
            }
            self.pattern_colors = colors;
            return Ok(());
        }
        let category: HighlightCategory = name.parse()?;
        let color = validate_hex(name, value.trim())?;
        self.colors.insert(category, color);
        Ok(())
    }

    pub fn color(&self, category: HighlightCategory) -> &str {
        self.colors
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.default_color())
    }

    /// Color for the n-th pattern group; cycles when there are more groups than colors.
    pub fn pattern_color(&self, index: usize) -> &str {
        &self.pattern_colors[index % self.pattern_colors.len()]
    }
}

/// One fill the host should apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub address: String,
    pub category: HighlightCategory,
    pub color: String,
}

impl Highlight {
    pub fn new(address: impl Into<String>, category: HighlightCategory, palette: &Palette) -> Self {
        Self {
            address: address.into(),
            category,
            color: palette.color(category).to_string(),
        }
    }
}

fn validate_hex(category: &str, value: &str) -> Result<String> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AddressError::InvalidColor {
            category: category.to_string(),
            value: value.to_string(),
        });
    }
    Ok(value.to_ascii_uppercase())
}

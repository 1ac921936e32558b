//! Settings file for the command-line tool.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use cellscope_compare::CompareOptions;
use cellscope_primitives::Palette;

/// Contents of the `--config` YAML file. Every section is optional.
///
/// ```yaml
/// palette:
///   input: "#C6EFCE"
///   pattern: "#FF0000,#00FF00"
/// compare:
///   ignore_reference_only_differences: true
/// trace:
///   max_depth: 3
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub palette: HashMap<String, String>,
    pub compare: CompareOptions,
    pub trace: TraceSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceSettings {
    /// 0 means unlimited
    pub max_depth: usize,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml(&source).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    /// Palette from the file, then `KEY=VALUE` overrides from the command line
    pub fn palette(&self, overrides: &[String]) -> Result<Palette> {
        let mut palette = Palette::with_overrides(&self.palette)?;
        for entry in overrides {
            let (key, value) = entry.split_once('=').with_context(|| {
                format!("Invalid color format: '{entry}'. Expected KEY=VALUE format")
            })?;
            palette.set(key, value)?;
        }
        Ok(palette)
    }
}

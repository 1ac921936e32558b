use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use cellscope_formulas::CellReference;
use cellscope_primitives::CellRange;
use cellscope_sheet::{same_sheet_name, Scope};

use crate::Diagnostic;

/// Edges of one address. `formula_text` is empty for leaves that were only
/// discovered as reference targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub precedents: IndexSet<String>,
    pub dependents: IndexSet<String>,
    pub formula_text: String,
}

impl DependencyEntry {
    pub fn has_formula(&self) -> bool {
        !self.formula_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Precedents,
    Dependents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub address: String,
    pub depth: usize,
}

/// Bidirectional adjacency map keyed by fully-qualified address.
///
/// Edges are only added through [`DependencyGraph::add_edge`], which writes
/// both directions, so `graph[x].precedents ∋ y` implies
/// `graph[y].dependents ∋ x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    scope: Scope,
    entries: IndexMap<String, DependencyEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl DependencyGraph {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            entries: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Record a formula cell, creating its entry if needed
    pub fn add_formula(&mut self, key: impl Into<String>, formula_text: impl Into<String>) {
        self.entries.entry(key.into()).or_default().formula_text = formula_text.into();
    }

    /// Record `formula` → `precedent` in both directions
    pub fn add_edge(&mut self, formula: &str, precedent: &str) {
        self.entries
            .entry(formula.to_string())
            .or_default()
            .precedents
            .insert(precedent.to_string());
        self.entries
            .entry(precedent.to_string())
            .or_default()
            .dependents
            .insert(formula.to_string());
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn get(&self, key: &str) -> Option<&DependencyEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &DependencyEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that carry formula text
    pub fn formula_count(&self) -> usize {
        self.entries.values().filter(|e| e.has_formula()).count()
    }

    /// Whether the address exists in the graph with formula text
    pub fn has_formula(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(DependencyEntry::has_formula)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Distinct addresses that could not be fully analyzed
    pub fn skipped_count(&self) -> usize {
        self.diagnostics
            .iter()
            .map(|d| d.address.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Every address reachable from `address`, breadth-first, with its depth.
    ///
    /// Cells inside a range node are linked to it: a cell's dependents include
    /// the dependents of every range key that contains it, and a range key's
    /// precedents are the graph cells inside it. A visited set keeps circular
    /// references from looping. `max_depth` of 0 means unlimited.
    pub fn trace(&self, address: &str, direction: Direction, max_depth: usize) -> Vec<TraceStep> {
        let start = canonical_key(address);
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut steps = Vec::new();

        visited.insert(start.clone());
        queue.push_back((start, 0));

        while let Some((key, depth)) = queue.pop_front() {
            if max_depth != 0 && depth >= max_depth {
                continue;
            }
            for next in self.neighbours(&key, direction) {
                if visited.insert(next.clone()) {
                    steps.push(TraceStep {
                        address: next.clone(),
                        depth: depth + 1,
                    });
                    queue.push_back((next, depth + 1));
                }
            }
        }
        steps
    }

    fn neighbours(&self, key: &str, direction: Direction) -> Vec<String> {
        let mut out: Vec<String> = match (self.entries.get(key), direction) {
            (Some(entry), Direction::Precedents) => entry.precedents.iter().cloned().collect(),
            (Some(entry), Direction::Dependents) => entry.dependents.iter().cloned().collect(),
            (None, _) => Vec::new(),
        };

        let Some((sheet, bounds)) = locate(key) else {
            return out;
        };
        let is_range = bounds.size() > 1;
        for (other, entry) in &self.entries {
            if other == key {
                continue;
            }
            let Some((other_sheet, other_bounds)) = locate(other) else {
                continue;
            };
            if !same_sheet_name(&other_sheet, &sheet) {
                continue;
            }
            let linked = match direction {
                Direction::Dependents => {
                    other_bounds.size() > 1
                        && other_bounds.contains_range(&bounds)
                        && !entry.dependents.is_empty()
                }
                Direction::Precedents => {
                    is_range && other_bounds.size() == 1 && bounds.contains(&other_bounds.start)
                }
            };
            if !linked {
                continue;
            }
            match direction {
                Direction::Dependents => out.extend(entry.dependents.iter().cloned()),
                Direction::Precedents => out.push(other.clone()),
            }
        }
        out
    }
}

fn locate(key: &str) -> Option<(String, CellRange)> {
    let reference = CellReference::from_qualified(key).ok()?;
    if reference.workbook.is_some() {
        return None;
    }
    let bounds = reference.bounds().ok()?;
    Some((reference.sheet, bounds))
}

fn canonical_key(address: &str) -> String {
    CellReference::from_qualified(address.trim())
        .map_or_else(|_| address.trim().to_string(), |r| r.qualified())
}

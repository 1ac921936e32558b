//! # cellscope-cli
//!
//! Command-line front end for cellscope. It stands in for the host
//! spreadsheet: grids are loaded from `.json` or `.xlsx` files and results
//! are printed as text or JSON instead of being painted onto cells.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use cellscope_compare::{compare, difference_highlights};
use cellscope_dag::{build_graph, DependencyGraph, Direction};
use cellscope_flow::{analyze_flow, formula_patterns, highlight_plan};
use cellscope_formulas::{
    annotate_branches, check_formula, extract_references, normalize_formula, parse, CellReference,
};
use cellscope_primitives::CellValue;
use cellscope_sheet::{CellFormulaProvider, Scope, SheetGrid, Workbook};

mod config;
mod render;

use config::Settings;

/// cellscope - formula structure, dependency flow and sheet comparison
#[derive(Parser)]
#[command(name = "cellscope")]
#[command(author, version, about = "Spreadsheet formula analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (YAML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override a highlight color (category=#RRGGBB)
    #[arg(short = 'C', long = "color", value_name = "KEY=VALUE", global = true)]
    colors: Vec<String>,

    /// Output format (text, json)
    #[arg(short = 'f', long = "format", default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Parse one formula into its expression tree
    Parse {
        formula: String,
        /// Evaluated arguments of the outer function, to mark the active branch
        #[arg(short = 'a', long = "arg", value_name = "VALUE")]
        args: Vec<String>,
    },
    /// List the references written in one formula
    Refs {
        formula: String,
        /// Sheet the formula lives on
        #[arg(short, long, default_value = "Sheet1")]
        sheet: String,
    },
    /// Build the dependency graph of a workbook
    Graph {
        workbook: PathBuf,
        /// `*`, a sheet name, or `Sheet!A1:C10`
        #[arg(short, long, default_value = "*")]
        scope: String,
    },
    /// Trace precedents (or dependents) of one cell
    Trace {
        workbook: PathBuf,
        /// Qualified address, e.g. `Sheet1!B2`
        address: String,
        /// Follow dependents instead of precedents
        #[arg(long)]
        dependents: bool,
        /// Maximum depth, 0 for unlimited
        #[arg(short, long)]
        depth: Option<usize>,
        #[arg(short, long, default_value = "*")]
        scope: String,
    },
    /// Classify formula cells as inputs, calculations, outputs and orphans
    Flow {
        workbook: PathBuf,
        #[arg(short, long, default_value = "*")]
        scope: String,
        /// Focus area for the inflow/outflow overlay
        #[arg(long)]
        focus: Option<String>,
        /// Print the fills to apply instead of the groups
        #[arg(long)]
        highlights: bool,
    },
    /// Group the formulas of one sheet by relative pattern
    Patterns { workbook: PathBuf, sheet: String },
    /// Compare one sheet of two workbooks
    Compare {
        reference: PathBuf,
        comparator: PathBuf,
        /// Sheet to compare (defaults to the first sheet)
        #[arg(short, long)]
        sheet: Option<String>,
        /// Sheet of the comparator workbook, when named differently
        #[arg(long)]
        against: Option<String>,
        /// Compare computed values instead of formulas
        #[arg(long)]
        values: bool,
        /// Ignore formulas that only differ in their references
        #[arg(long)]
        ignore_references: bool,
        /// Detect inserted and deleted rows
        #[arg(long)]
        align: bool,
        /// Print the fills to apply instead of the blocks
        #[arg(long)]
        highlights: bool,
    },
}

/// Output format for results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON output
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    run(&cli, &settings)
}

fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let format = cli.format;
    match &cli.command {
        Command::Parse { formula, args } => {
            if let Err(err) = check_formula(formula) {
                eprint!("{}", render::warning(&err.to_string()));
            }
            let mut node = parse(formula);
            if !args.is_empty() {
                let values: Vec<CellValue> = args.iter().map(|a| CellValue::parse(a)).collect();
                annotate_branches(&mut node, &values);
            }
            emit(format, &node, || node.pretty())
        }
        Command::Refs { formula, sheet } => {
            let references = extract_references(formula);
            let normalized = normalize_formula(formula);
            let payload = serde_json::json!({
                "references": references,
                "resolved": references
                    .iter()
                    .map(|r| r.resolve(sheet).qualified())
                    .collect::<Vec<_>>(),
                "normalized": normalized,
            });
            emit(format, &payload, || {
                render::references(&references, sheet, &normalized)
            })
        }
        Command::Graph { workbook, scope } => {
            let graph = load_graph(workbook, scope)?;
            warn_skipped(&graph);
            emit(format, &graph, || render::graph(&graph))
        }
        Command::Trace {
            workbook,
            address,
            dependents,
            depth,
            scope,
        } => {
            let mut start = CellReference::from_qualified(address)
                .with_context(|| format!("Invalid address: '{address}'. Expected Sheet!A1"))?;
            let book = load_workbook(workbook)?;
            if let Some(canonical) = book.canonical_sheet_name(&start.sheet) {
                start.sheet = canonical;
            }
            let start = start.qualified();
            let graph = build_graph(&Scope::parse(scope)?, &book)?;
            let direction = if *dependents {
                Direction::Dependents
            } else {
                Direction::Precedents
            };
            let max_depth = depth.unwrap_or(settings.trace.max_depth);
            let steps = graph.trace(&start, direction, max_depth);
            emit(format, &steps, || render::trace(&start, &steps))
        }
        Command::Flow {
            workbook,
            scope,
            focus,
            highlights,
        } => {
            let book = load_workbook(workbook)?;
            let scope = Scope::parse(scope)?;
            let graph = build_graph(&scope, &book)?;
            let focus = focus.as_deref().map(Scope::parse).transpose()?;
            let report = analyze_flow(&graph, graph.scope(), focus.as_ref());
            let mut found = graph.diagnostics().to_vec();
            found.extend_from_slice(report.diagnostics());
            eprint!("{}", render::diagnostics(&found));
            if *highlights {
                let plan = highlight_plan(&report, &settings.palette(&cli.colors)?);
                return emit(format, &plan, || render::highlights(&plan));
            }
            emit(format, &report, || render::flow(&report))
        }
        Command::Patterns { workbook, sheet } => {
            let book = load_workbook(workbook)?;
            let grid = book.require_sheet(sheet)?;
            let patterns = formula_patterns(grid, &settings.palette(&cli.colors)?);
            emit(format, &patterns, || render::patterns(&patterns))
        }
        Command::Compare {
            reference,
            comparator,
            sheet,
            against,
            values,
            ignore_references,
            align,
            highlights,
        } => {
            let mut options = settings.compare;
            if *values {
                options.by_formula = false;
            }
            options.ignore_reference_only_differences |= *ignore_references;
            options.detect_row_insertions |= *align;

            let reference_book = load_workbook(reference)?;
            let comparator_book = load_workbook(comparator)?;
            let reference_grid = pick_sheet(&reference_book, sheet.as_deref())?;
            // Without an explicit name, prefer the sheet named like the reference one.
            let comparator_grid = match (against.as_deref(), sheet.as_deref()) {
                (Some(name), _) | (None, Some(name)) => pick_sheet(&comparator_book, Some(name))?,
                (None, None) => comparator_book
                    .sheet(&reference_grid.name)
                    .map_or_else(|| pick_sheet(&comparator_book, None), Ok)?,
            };

            let result = compare(reference_grid, comparator_grid, &options);
            if *highlights {
                let plan = difference_highlights(&result, &settings.palette(&cli.colors)?);
                return emit(format, &plan, || render::highlights(&plan));
            }
            emit(format, &result, || {
                render::comparison(&result, options.by_formula)
            })
        }
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => print!("{}", text()),
    }
    Ok(())
}

fn load_workbook(path: &Path) -> Result<Workbook> {
    let book = Workbook::load(path)
        .with_context(|| format!("Failed to load workbook: {}", path.display()))?;
    book.validate()?;
    Ok(book)
}

fn load_graph(path: &Path, scope: &str) -> Result<DependencyGraph> {
    let book = load_workbook(path)?;
    let scope = Scope::parse(scope)?;
    Ok(build_graph(&scope, &book)?)
}

/// Named sheet, or the first sheet of the workbook.
fn pick_sheet<'a>(book: &'a Workbook, name: Option<&str>) -> Result<&'a SheetGrid> {
    if let Some(name) = name {
        return Ok(book.require_sheet(name)?);
    }
    match book.sheets().next() {
        Some(grid) => Ok(grid),
        None => bail!("Workbook has no sheets"),
    }
}

fn warn_skipped(graph: &DependencyGraph) {
    eprint!("{}", render::diagnostics(graph.diagnostics()));
}

//! Demo of host grids, scopes and JSON loading
//!
//! Run with: cargo run --example sheet_demo -p cellscope-sheet

use cellscope_primitives::{CellAddress, CellValue};
use cellscope_sheet::{CellFormulaProvider, Scope, SheetGrid, Workbook};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Workbook Demo ===\n");

    let temp_dir = env::temp_dir();

    // -------------------------------------------------------------------------
    // Grids as the host hands them over
    // -------------------------------------------------------------------------
    let inputs = SheetGrid::from_formulas("Inputs", vec![vec!["Rate", "0.05"], vec!["Units", "120"]])
        .with_values(vec![
            vec![CellValue::from("Rate"), CellValue::Float(0.05)],
            vec![CellValue::from("Units"), CellValue::Int(120)],
        ]);
    let mut calc = SheetGrid::with_anchor("Calc", CellAddress::new(2, 2));
    calc.set_formula(CellAddress::new(2, 2), "=Inputs!B2*10");
    calc.set_formula(CellAddress::new(3, 2), "=B2*(1+Inputs!B1)");

    let book = Workbook::new().with_sheet(inputs).with_sheet(calc);
    book.validate()?;

    for grid in book.sheets() {
        println!(
            "{}: {} rows x {} cols, bounds {:?}",
            grid.name,
            grid.row_count(),
            grid.col_count(),
            grid.bounds().map(|b| b.to_string())
        );
        for (cell, text) in grid.formula_cells() {
            println!("  {cell} {text}");
        }
    }

    // -------------------------------------------------------------------------
    // Scopes
    // -------------------------------------------------------------------------
    println!("\n--- Scopes ---\n");
    for text in ["*", "calc", "'Calc'!B2:B3"] {
        let scope = Scope::parse(text)?.validate(&book)?;
        println!("{text:>14} -> {scope} over {:?}", scope.sheets());
    }
    match Scope::sheet("Missing").validate(&book) {
        Ok(_) => println!("unexpected"),
        Err(e) => println!("{:>14} -> {e}", "Missing"),
    }

    // -------------------------------------------------------------------------
    // JSON round trip
    // -------------------------------------------------------------------------
    println!("\n--- JSON ---\n");
    let path = temp_dir.join("cellscope_demo.json");
    std::fs::write(&path, book.to_json_string()?)?;
    let loaded = Workbook::load(&path)?;
    println!("Reloaded {} sheets from {}", loaded.len(), path.display());
    println!(
        "Calc!B3 = {}",
        loaded.formula_text("Calc", CellAddress::new(3, 2))
    );
    std::fs::remove_file(&path)?;

    println!("\n=== Demo Complete ===");
    Ok(())
}

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use cellscope_primitives::{CellAddress, CellValue};

use crate::book::Workbook;
use crate::error::Result;
use crate::grid::SheetGrid;

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel serial date (days since 1899-12-30)
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

/// Smallest 0-based (start, end) pair covering both ranges
fn union_extent<A, B>(values: &Range<A>, formulas: &Range<B>) -> Option<((u32, u32), (u32, u32))>
where
    A: calamine::CellType,
    B: calamine::CellType,
{
    let spans = [
        values.start().zip(values.end()),
        formulas.start().zip(formulas.end()),
    ];
    spans.into_iter().flatten().reduce(|(s1, e1), (s2, e2)| {
        (
            (s1.0.min(s2.0), s1.1.min(s2.1)),
            (e1.0.max(e2.0), e1.1.max(e2.1)),
        )
    })
}

fn read_sheet(workbook: &mut Xlsx<BufReader<File>>, name: &str) -> Result<SheetGrid> {
    let values = workbook.worksheet_range(name)?;
    let formulas = workbook.worksheet_formula(name)?;

    let Some((start, end)) = union_extent(&values, &formulas) else {
        return Ok(SheetGrid::new(name));
    };

    let mut grid = SheetGrid::with_anchor(name, CellAddress::new(start.0 + 1, start.1 + 1));
    for row in start.0..=end.0 {
        let mut formula_row = Vec::new();
        let mut value_row = Vec::new();
        for col in start.1..=end.1 {
            let value = values
                .get_value((row, col))
                .map_or(CellValue::Null, data_to_cell_value);
            let formula = formulas
                .get_value((row, col))
                .filter(|text| !text.is_empty())
                .map(|text| {
                    if text.starts_with('=') {
                        text.clone()
                    } else {
                        format!("={text}")
                    }
                });
            formula_row.push(formula.unwrap_or_else(|| value.to_string()));
            value_row.push(value);
        }
        grid.formulas.push(formula_row);
        grid.values.push(value_row);
    }
    grid.validate()?;
    Ok(grid)
}

impl Workbook {
    /// Load every sheet of an Excel file: formulas (with a leading `=`) plus
    /// cached values. Constant cells carry their display text as formula text.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or a sheet cannot be read.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook: Xlsx<BufReader<File>> = open_workbook(path.as_ref())?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

        let mut book = Workbook::new();
        for name in sheet_names {
            let grid = read_sheet(&mut workbook, &name)?;
            tracing::debug!(
                sheet = %name,
                rows = grid.row_count(),
                cols = grid.col_count(),
                "loaded sheet from xlsx"
            );
            book.add_sheet(grid);
        }
        Ok(book)
    }
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cellscope_compare::{compare, CompareOptions};
use cellscope_dag::build_graph;
use cellscope_formulas::{extract_references, normalize_formula, parse};
use cellscope_sheet::{Scope, SheetGrid, Workbook};

/// One column of constants and a running total next to it.
fn running_total(rows: usize) -> SheetGrid {
    let formulas = (1..=rows)
        .map(|row| {
            let total = if row == 1 {
                "=A1".to_string()
            } else {
                format!("=B{}+A{row}", row - 1)
            };
            vec![(row as f64 * 1.5).to_string(), total]
        })
        .collect::<Vec<_>>();
    SheetGrid::from_formulas("Data", formulas)
}

fn bench_parse_formulas(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("simple", |b| b.iter(|| parse(black_box("=1+2"))));

    group.bench_function("cell_ref", |b| b.iter(|| parse(black_box("=A1+B2"))));

    group.bench_function("function_call", |b| {
        b.iter(|| parse(black_box("=SUM(A1:A10)")))
    });

    group.bench_function("nested", |b| {
        b.iter(|| parse(black_box("=IF(A1>10,SUM(B1:B10),AVERAGE(C1:C10))")))
    });

    group.bench_function("complex", |b| {
        b.iter(|| {
            parse(black_box(
                "=IF(AND(A1>0,B1<100),SUM(C1:C10)*1.1,MAX(D1:D10)/MIN(E1:E10))",
            ))
        })
    });

    group.finish();
}

fn bench_references(c: &mut Criterion) {
    let mut group = c.benchmark_group("references");
    let formula = "=SUM('Q1 Sales'!$B$2:B200)*Rates!C3+[Budget.xlsx]Plan!D4-OFFSET(A1,1,0)&\"A1\"";

    group.bench_function("extract", |b| {
        b.iter(|| extract_references(black_box(formula)))
    });

    group.bench_function("normalize", |b| {
        b.iter(|| normalize_formula(black_box(formula)))
    });

    group.finish();
}

fn bench_build_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");

    for size in [100, 1000, 10000].iter() {
        let book = Workbook::new().with_sheet(running_total(*size));
        let scope = Scope::workbook();
        group.bench_with_input(BenchmarkId::new("running_total", size), size, |b, _| {
            b.iter(|| build_graph(black_box(&scope), black_box(&book)))
        });
    }

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    for size in [100, 1000].iter() {
        let reference = running_total(*size);
        let mut comparator = running_total(*size);
        comparator.formulas[size / 2][1] = "=0".to_string();
        let options = CompareOptions {
            ignore_reference_only_differences: true,
            detect_row_insertions: true,
            ..CompareOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("aligned", size), size, |b, _| {
            b.iter(|| compare(black_box(&reference), black_box(&comparator), &options))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_formulas,
    bench_references,
    bench_build_graph,
    bench_compare
);
criterion_main!(benches);

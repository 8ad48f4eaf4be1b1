//! Throughput of the cathode recipe on a synthetic raw table

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use labfeat::recipes::cathode_recipe;
use labfeat::{Pipeline, PipelineConfig};
use polars::prelude::*;
use std::hint::black_box;

fn sample_value(column: &str, row: usize) -> String {
    match column {
        "molecular formula" => ["LiNi0.8Co0.1Mn0.1O2", "LiCoO2", "LiFePO4"][row % 3].to_string(),
        "dopant element" => ["Al", "Mg, Ti", ""][row % 3].to_string(),
        "annealing temperature" => format!("{}°C for 5h; {}°C for 12h", 450 + row % 100, 750 + row % 50),
        "annealing time" => format!("{}h, 12h", 1 + row % 10),
        "voltage range" => "2.8-4.3V".to_string(),
        "electrolyte system" => ["1 M LiPF6 in EC/DMC", "LiTFSI in water"][row % 2].to_string(),
        "cycles" => format!("{} cycles", 50 + row % 500),
        "capacity" => format!("{}.5 mAh/g", 150 + row % 60),
        "capacity retention" => ["92.3%", "0.887", "8870"][row % 3].to_string(),
        "first Coulombic efficiency" => format!("{}%", 80 + row % 15),
        "anode material" => ["Li metal", "graphite"][row % 2].to_string(),
        "coating material" => ["Al2O3", "carbon", ""][row % 3].to_string(),
        _ => format!("value {}", row % 7),
    }
}

fn raw_table(rows: usize) -> DataFrame {
    let recipe = cathode_recipe().expect("cathode recipe");
    let columns: Vec<Column> = recipe
        .input_columns()
        .iter()
        .map(|name| {
            let values: Vec<String> = (0..rows).map(|row| sample_value(name, row)).collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();
    DataFrame::new(columns).expect("raw table")
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("cathode_recipe");
    let runtime = tokio::runtime::Runtime::new().expect("runtime");

    for rows in [100, 1_000, 10_000] {
        let table = raw_table(rows);
        let sequential = Pipeline::new(cathode_recipe().expect("cathode recipe"));
        let concurrent = Pipeline::new(cathode_recipe().expect("cathode recipe"))
            .with_config(PipelineConfig::default().with_concurrency());

        group.bench_with_input(BenchmarkId::new("sequential", rows), &table, |b, table| {
            b.iter(|| sequential.transform(black_box(table)).expect("transform"))
        });
        group.bench_with_input(BenchmarkId::new("concurrent", rows), &table, |b, table| {
            b.iter(|| {
                runtime
                    .block_on(concurrent.transform_concurrent(black_box(table)))
                    .expect("transform")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_transform);
criterion_main!(benches);

//! Conditional formatting and dispatch performance benchmarks.
//!
//! Measures per-row style evaluation and fan-out cost on a busy page.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dashlink::data::Datum;
use dashlink::formatting::{ConditionalFormat, ConditionalFormatEvaluator, FormatRule, HeatmapFormat, Operator, Style};
use dashlink::interaction::{ActionReactionBus, Query};
use dashlink::mapping::{ColumnMap, ColumnRef};
use dashlink::plugin::{builtin, PluginRegistry, RecordingPlugin};
use dashlink::schema::Column;
use dashlink::Visualization;

/// Pivot-style rows with two measures.
fn generate_rows(rows: usize) -> Vec<Datum> {
    let regions = ["East", "West", "North", "South"];
    (0..rows)
        .map(|i| {
            Datum::new()
                .with_multi("rows", vec![("Region", regions[i % regions.len()])])
                .with_multi(
                    "measures",
                    vec![("Revenue", (i * 37 % 1000) as f64), ("Cost", (i * 11 % 500) as f64)],
                )
        })
        .collect()
}

fn generate_formats(rules: usize) -> Vec<ConditionalFormat> {
    let revenue = ColumnRef::indexed("measures", 0);
    let mut formats: Vec<ConditionalFormat> = (0..rules)
        .map(|i| {
            FormatRule::new(
                revenue.clone(),
                Operator::Greater,
                (i * 100) as f64,
                Style::new(format!("#{:02x}0000", (i * 20) % 256)),
            )
            .into()
        })
        .collect();
    formats.push(HeatmapFormat::new(ColumnRef::indexed("measures", 1), "#5DA5DA").into());
    formats
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for rows in [100, 1_000, 10_000] {
        let data = generate_rows(rows);
        let eval = ConditionalFormatEvaluator::new(generate_formats(8)).with_data(&data);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| {
                for datum in data {
                    black_box(eval.evaluate(black_box(datum)));
                }
            })
        });
    }

    group.finish();
}

fn bench_evaluator_setup(c: &mut Criterion) {
    let data = generate_rows(10_000);
    c.bench_function("evaluator_with_data_10k", |b| {
        b.iter(|| ConditionalFormatEvaluator::new(generate_formats(8)).with_data(black_box(&data)))
    });
}

fn bench_fire(c: &mut Criterion) {
    let mut registry = PluginRegistry::new();
    builtin::register_all(&mut registry, Arc::new(RecordingPlugin::new())).unwrap();
    let mut group = c.benchmark_group("fire_broadcast");

    for targets in [4, 16, 64] {
        let mut bus = ActionReactionBus::new();
        for i in 0..=targets {
            let vis = Visualization::new(format!("v{}", i), "pie")
                .with_columns(ColumnMap::new().with_single("category", Column::new("\"Geo\".\"Region\"", "Region")))
                .with_query(Query::new("Sales"));
            bus.register(vis, registry.get("pie").unwrap()).unwrap();
        }
        let payload = vec![Datum::new().with("category", "East")];

        group.bench_with_input(BenchmarkId::new("targets", targets), &payload, |b, payload| {
            b.iter(|| black_box(bus.fire("v0", "clickSlice", payload).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_evaluator_setup, bench_fire);
criterion_main!(benches);

//! Criterion benchmarks for drainage resolution.
//!
//! Benchmarks:
//!   - graph construction (initial downhill routing) on generated terrain
//!   - lake resolution on a freshly built graph
//!   - flow extraction for every cell after lakes are resolved
//!
//! Run with: cargo bench -p hydrology --bench drainage_bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use hydrology::pipeline::generate_inputs;
use hydrology::{DrainageConfig, DrainageGraph, FlowExtractor};

fn config(size: usize) -> DrainageConfig {
    DrainageConfig {
        rows: size,
        cols: size,
        rain_focus: Some((size as f64 * 0.9, size as f64 * 0.1)),
        ..DrainageConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Benchmark: graph construction
// ---------------------------------------------------------------------------

fn bench_build_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("drainage_build");

    for size in [40, 128] {
        let Ok(inputs) = generate_inputs(&config(size)) else {
            continue;
        };
        group.bench_function(format!("{size}x{size}"), |b| {
            b.iter(|| black_box(DrainageGraph::new(black_box(&inputs.elevation))));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: lake resolution
// ---------------------------------------------------------------------------

fn bench_calculate_lakes(c: &mut Criterion) {
    let mut group = c.benchmark_group("drainage_lakes");
    group.sample_size(20);

    for size in [40, 128] {
        let Ok(inputs) = generate_inputs(&config(size)) else {
            continue;
        };
        let graph = DrainageGraph::new(&inputs.elevation);
        group.bench_function(format!("{size}x{size}"), |b| {
            b.iter_batched(
                || graph.clone(),
                |mut g| black_box(g.calculate_lakes().is_ok()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: flow extraction
// ---------------------------------------------------------------------------

fn bench_extract_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("drainage_flow");
    group.sample_size(20);

    let Ok(inputs) = generate_inputs(&config(64)) else {
        return;
    };
    let mut graph = DrainageGraph::new(&inputs.elevation);
    if graph.calculate_lakes().is_err() {
        return;
    }
    graph.add_constant_rainfall(1.0);

    group.bench_function("maximum_flow_64x64", |b| {
        b.iter(|| black_box(graph.maximum_flow()));
    });
    group.bench_function("extract_values_64x64", |b| {
        b.iter(|| black_box(graph.extract_values(&FlowExtractor::recorded())));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_build_graph,
    bench_calculate_lakes,
    bench_extract_flow
);
criterion_main!(benches);

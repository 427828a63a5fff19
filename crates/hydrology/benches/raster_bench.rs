//! Criterion benchmarks for raster generation and resampling.
//!
//! Run with: cargo bench -p hydrology --bench raster_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hydrology::terrain::{random_slope_raster, seeded_rng, TerrainParams};

fn params(size: usize) -> TerrainParams {
    TerrainParams {
        rows: size,
        cols: size,
        ..TerrainParams::default()
    }
}

// ---------------------------------------------------------------------------
// Benchmark: terrain generation
// ---------------------------------------------------------------------------

fn bench_random_slope_raster(c: &mut Criterion) {
    let mut group = c.benchmark_group("raster_generate");

    for size in [40, 256] {
        let p = params(size);
        group.bench_function(format!("slope_{size}x{size}"), |b| {
            b.iter(|| black_box(random_slope_raster(black_box(&p), &mut seeded_rng(42)).is_ok()));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: resampling
// ---------------------------------------------------------------------------

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("raster_resample");

    let Ok(raster) = random_slope_raster(&params(256), &mut seeded_rng(42)) else {
        return;
    };
    for factor in [1, 2, 4] {
        group.bench_function(format!("factor_{factor}"), |b| {
            b.iter(|| black_box(raster.create_with_increased_cellsize(black_box(factor)).is_ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_random_slope_raster, bench_resample);
criterion_main!(benches);

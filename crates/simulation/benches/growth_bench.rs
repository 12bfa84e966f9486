//! Criterion benchmarks for the growth engine.
//!
//! Measures the two hot paths of a step on synthetic landscapes: scoring
//! every undeveloped cell, and a whole step (recompute plus per-region patch
//! growth) driven through the headless app.
//!
//! Run with: cargo bench -p simulation --bench growth_bench --features bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::time::Duration;

use simulation::driver::GrowthRun;
use simulation::synthetic::SyntheticConfig;
use simulation::test_harness::TestRun;
use simulation::undeveloped_index::UndevelopedIndex;

const SIZES: [usize; 3] = [64, 128, 256];

fn synthetic_run(size: usize) -> GrowthRun {
    SyntheticConfig {
        rows: size,
        cols: size,
        num_steps: 5,
        ..Default::default()
    }
    .generate()
    .into_run()
    .expect("synthetic scenario should load")
}

// ---------------------------------------------------------------------------
// Benchmark: probability recompute
// ---------------------------------------------------------------------------

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute_probabilities");
    for size in SIZES {
        let mut run = synthetic_run(size);
        let mut index = UndevelopedIndex::default();
        group.bench_with_input(BenchmarkId::from_parameter(format!("{size}x{size}")), &size, |b, _| {
            b.iter(|| {
                index
                    .recompute(&mut run.landscape, &run.regions, &run.model)
                    .expect("recompute");
                black_box(index.len());
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: one full step through the app
// ---------------------------------------------------------------------------

fn bench_full_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("growth_step");
    group.measurement_time(Duration::from_secs(20));
    group.sample_size(10);
    for size in SIZES {
        group.bench_with_input(BenchmarkId::new("first_step", format!("{size}x{size}")), &size, |b, &size| {
            b.iter_batched(
                || TestRun::from_run(synthetic_run(size)),
                |mut run| {
                    run.step();
                    run
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_recompute, bench_full_step);
criterion_main!(benches);

//! Snapshot encode/decode throughput on synthetic landscapes.
//!
//! Measures the full pipeline: developed layer -> bitcode -> lz4 -> header,
//! and the reverse.
//!
//! Run with: `cargo bench -p save --bench snapshot_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use save::{decode_snapshot, encode_snapshot, DevelopedSnapshot};
use simulation::synthetic::SyntheticConfig;

fn snapshot_of(size: usize) -> DevelopedSnapshot {
    let run = SyntheticConfig {
        rows: size,
        cols: size,
        ..Default::default()
    }
    .generate()
    .into_run()
    .expect("synthetic scenario should load");
    DevelopedSnapshot::from_landscape(&run.landscape, 0, None)
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    for size in [128usize, 512, 1024] {
        let snapshot = snapshot_of(size);
        let bytes = encode_snapshot(&snapshot);
        let label = format!("{size}x{size}");

        group.bench_with_input(BenchmarkId::new("encode", &label), &snapshot, |b, s| {
            b.iter(|| black_box(encode_snapshot(s)));
        });
        group.bench_with_input(BenchmarkId::new("decode", &label), &bytes, |b, bytes| {
            b.iter(|| black_box(decode_snapshot(bytes).expect("decode")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_snapshot);
criterion_main!(benches);

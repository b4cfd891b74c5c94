//! Benchmarks for apportionment recomputation and curation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use confluence_algorithms::apportionment::{ApportionmentEngine, WeightingFactor};
use confluence_core::StreamSegment;
use geo_types::{line_string, Point};

fn create_candidates(n: usize) -> Vec<StreamSegment> {
    (0..n)
        .map(|i| {
            // Every third segment repeats a code, so overlap removal has work to do
            let code = format!("100-{:06}", i - i % 3);
            StreamSegment::new(
                i as i64,
                line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
                Point::new(0.0, 0.0),
                1.0 + ((i * 37) % 997) as f64,
            )
            .with_watershed_code(code)
        })
        .collect()
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("apportionment/recompute");
    for n in [100, 1_000, 10_000] {
        let mut engine = ApportionmentEngine::new(WeightingFactor::Squared);
        engine.load(create_candidates(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(&mut engine).recompute())
        });
    }
    group.finish();
}

fn bench_curation(c: &mut Criterion) {
    let mut group = c.benchmark_group("apportionment/curation");
    for n in [100, 1_000, 10_000] {
        let candidates = create_candidates(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut engine = ApportionmentEngine::default();
                engine.load(black_box(candidates.clone()));
                engine.remove_overlaps();
                engine.remove_below_threshold(0.01)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_recompute, bench_curation);
criterion_main!(benches);

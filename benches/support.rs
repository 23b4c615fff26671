//! Micro-benchmarks for support counting on packed bit vectors.
//!
//! Run with:
//! ```bash
//! cargo bench --bench support
//! ```

use corels_rs::bitvec::BitVec;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Generate a deterministic random bit vector for reproducible benchmarks.
fn random_bits(seed: u64, len: usize, density: f64) -> BitVec {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    BitVec::from_bools((0..len).map(|_| rng.random_bool(density)))
}

fn bench_count_and(c: &mut Criterion) {
    let mut group = c.benchmark_group("support/count_and");

    for nsamples in [1_000, 10_000, 100_000, 1_000_000] {
        let a = random_bits(42, nsamples, 0.5);
        let b = random_bits(123, nsamples, 0.3);

        group.throughput(Throughput::Elements(nsamples as u64));
        group.bench_with_input(BenchmarkId::new("packed", nsamples), &(a, b), |bench, (a, b)| {
            bench.iter(|| black_box(a).count_and(black_box(b)));
        });
    }

    group.finish();
}

fn bench_count_naive(c: &mut Criterion) {
    let mut group = c.benchmark_group("support/count_naive");

    for nsamples in [1_000, 10_000, 100_000] {
        let a: Vec<bool> = random_bits(42, nsamples, 0.5).iter().collect();
        let b: Vec<bool> = random_bits(123, nsamples, 0.3).iter().collect();

        group.throughput(Throughput::Elements(nsamples as u64));
        group.bench_with_input(BenchmarkId::new("bools", nsamples), &(a, b), |bench, (a, b)| {
            bench.iter(|| {
                black_box(a)
                    .iter()
                    .zip(black_box(b))
                    .filter(|(x, y)| **x && **y)
                    .count()
            });
        });
    }

    group.finish();
}

fn bench_and_not(c: &mut Criterion) {
    let mut group = c.benchmark_group("support/and_not");

    for nsamples in [1_000, 100_000] {
        let uncaptured = random_bits(7, nsamples, 0.8);
        let rule = random_bits(8, nsamples, 0.2);

        group.throughput(Throughput::Elements(nsamples as u64));
        group.bench_with_input(
            BenchmarkId::new("alloc", nsamples),
            &(uncaptured, rule),
            |bench, (uncaptured, rule)| {
                bench.iter(|| black_box(uncaptured).and_not(black_box(rule)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_count_and, bench_count_naive, bench_and_not);

criterion_main!(benches);

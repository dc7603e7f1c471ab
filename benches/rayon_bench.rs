//! Benchmark for parallel iteration with rayon.
//!
//! Each element runs a CPU-bound mixing loop so that the cost of splitting
//! the spliterators is measured against real work rather than thread
//! synchronization alone.
//!
//! Requires the `rayon` feature to be enabled.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use persistent_collections::persistent::{PersistentHashMap, PersistentTreeSet};
use rayon::prelude::*;
use std::hint::black_box;

/// Runs 64 rounds of a SHA-256 style compression step over `input`.
#[inline(never)]
fn mix(input: u64) -> u64 {
    let mut state = [input, 0x6a09_e667_bb67_ae85, 0x3c6e_f372_a54f_f53a, 0x510e_527f_9b05_688c];
    for round in 0..64u64 {
        let first = state[3]
            .wrapping_add(state[1].rotate_right(6) ^ state[1].rotate_right(11))
            .wrapping_add((state[1] & state[2]) ^ (!state[1] & state[3]))
            .wrapping_add(round);
        let second = (state[0].rotate_right(2) ^ state[0].rotate_right(13))
            .wrapping_add((state[0] & state[1]) ^ (state[0] & state[2]) ^ (state[1] & state[2]));
        state[3] = state[2];
        state[2] = state[1];
        state[1] = state[0].wrapping_add(first);
        state[0] = first.wrapping_add(second);
    }
    state[0] ^ state[1] ^ state[2] ^ state[3]
}

fn benchmark_hashmap_mix(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("hashmap_mix");

    for size in [1_000u64, 10_000, 100_000] {
        let map: PersistentHashMap<u64, u64> = (0..size).map(|key| (key, key)).collect();

        group.bench_with_input(BenchmarkId::new("sequential", size), &size, |bencher, _| {
            bencher.iter(|| {
                let folded = map.values().map(|value| mix(*value)).fold(0, u64::wrapping_add);
                black_box(folded)
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &size, |bencher, _| {
            bencher.iter(|| {
                let folded = map
                    .par_iter()
                    .map(|(_, value)| mix(*value))
                    .reduce(|| 0, u64::wrapping_add);
                black_box(folded)
            });
        });
    }

    group.finish();
}

fn benchmark_treeset_collect(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("treeset_collect");

    for size in [1_000u64, 10_000, 100_000] {
        let set: PersistentTreeSet<u64> = (0..size).collect();

        group.bench_with_input(BenchmarkId::new("sequential", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mixed: Vec<u64> = set.iter().map(|element| mix(*element)).collect();
                black_box(mixed)
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mixed: Vec<u64> = set.par_iter().map(|element| mix(*element)).collect();
                black_box(mixed)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_hashmap_mix, benchmark_treeset_collect);

criterion_main!(benches);

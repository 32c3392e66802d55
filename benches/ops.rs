//! Criterion benchmarks for the hot paths: hits, insert churn, and mixed
//! operations against the sharded router.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lrukit::policy::lru::{LruCache, LruCore};
use lrukit::policy::sharded::ShardedLruCache;
use lrukit::traits::Cache;

fn bench_core_get_hit(c: &mut Criterion) {
    let mut cache: LruCore<u64, u64> = LruCore::new(10_000);
    for k in 0..10_000_u64 {
        cache.set(k, std::sync::Arc::new(k));
    }

    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("core_get_hit", |b| {
        b.iter(|| {
            let k = rng.gen_range(0..10_000_u64);
            black_box(cache.get(&k));
        })
    });
}

fn bench_core_insert_churn(c: &mut Criterion) {
    let mut cache: LruCore<u64, u64> = LruCore::new(1_000);
    let mut next = 0_u64;

    c.bench_function("core_insert_churn", |b| {
        b.iter(|| {
            // Fresh keys, so each insert past capacity also evicts.
            cache.set(next, std::sync::Arc::new(next));
            next += 1;
        })
    });
}

fn bench_locked_mixed(c: &mut Criterion) {
    let cache: LruCache<u64, u64> = LruCache::new(4_096);
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("locked_mixed_ops", |b| {
        b.iter(|| {
            let k = rng.gen_range(0..8_192_u64);
            match k % 4 {
                0 => cache.set(k, k),
                1 => {
                    black_box(cache.get(&k));
                }
                2 => {
                    cache.delete(&k);
                }
                _ => {
                    black_box(cache.length());
                }
            }
        })
    });
}

fn bench_sharded_mixed(c: &mut Criterion) {
    let cache: ShardedLruCache<u64, u64> = ShardedLruCache::new(8, 4_096);
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("sharded_mixed_ops", |b| {
        b.iter(|| {
            let k = rng.gen_range(0..8_192_u64);
            match k % 3 {
                0 => cache.set(k, k),
                1 => {
                    black_box(cache.get(&k));
                }
                _ => {
                    cache.delete(&k);
                }
            }
        })
    });
}

criterion_group!(
    benches,
    bench_core_get_hit,
    bench_core_insert_churn,
    bench_locked_mixed,
    bench_sharded_mixed
);
criterion_main!(benches);

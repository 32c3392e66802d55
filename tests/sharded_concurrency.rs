//! Router behavior and multi-threaded hammering through the public API.

#![cfg(feature = "concurrency")]

use std::sync::Arc;
use std::thread;

use lrukit::prelude::*;

#[test]
fn capacity_divides_evenly() {
    let cache: ShardedLruCache<u64, i64> = ShardedLruCache::new(4, 100);
    let caps: Vec<i64> = cache.shard_stats().iter().map(|s| s.capacity).collect();
    assert_eq!(caps, vec![25, 25, 25, 25]);
}

#[test]
fn capacity_remainder_lands_in_the_last_shard() {
    let cache: ShardedLruCache<u64, i64> = ShardedLruCache::new(4, 103);
    let caps: Vec<i64> = cache.shard_stats().iter().map(|s| s.capacity).collect();
    assert_eq!(caps, vec![25, 25, 25, 28]);
    assert_eq!(cache.capacity(), 103);
}

#[test]
fn each_shard_evicts_against_its_own_budget() {
    let cache: ShardedLruCache<u64, i64> = ShardedLruCache::new(4, 100);

    for k in 0..400 {
        cache.set(k, k as i64);
    }

    // Every shard is full to its own budget, so the whole router holds
    // exactly its total capacity in unit-size entries.
    assert_eq!(cache.length(), 100);
    for stats in cache.shard_stats() {
        assert!(stats.size <= stats.capacity);
        assert_eq!(stats.size, stats.length);
    }
    cache.check_invariants().unwrap();
}

#[test]
fn whole_cache_snapshots_cover_every_shard() {
    let cache: ShardedLruCache<u64, i64> = ShardedLruCache::new(4, 400);
    for k in 0..50 {
        cache.set(k, k as i64 * 10);
    }

    let mut keys = cache.keys();
    keys.sort_unstable();
    assert_eq!(keys, (0..50).collect::<Vec<u64>>());

    assert_eq!(cache.values().len(), 50);
    let items = cache.items();
    assert_eq!(items.len(), 50);
    for item in items {
        assert_eq!(*item.value, item.key as i64 * 10);
    }
}

#[test]
fn single_cache_survives_concurrent_mixed_ops() {
    let cache: LruCache<u64, i64> = LruCache::new(256);
    let mut handles = Vec::new();

    for t in 0..8_u64 {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            for i in 0..1_000_u64 {
                let k = (t * 31 + i) % 512;
                match i % 4 {
                    0 | 1 => cache.set(k, (t * 1_000 + i) as i64),
                    2 => {
                        cache.get(&k);
                    }
                    _ => {
                        cache.delete(&k);
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    cache.check_invariants().unwrap();
    assert!(cache.size() <= 256);
    assert_eq!(cache.length(), cache.size());
}

#[test]
fn sharded_cache_survives_concurrent_mixed_ops() {
    let cache: ShardedLruCache<u64, i64> = ShardedLruCache::new(8, 512);
    let mut handles = Vec::new();

    for t in 0..8_u64 {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            for i in 0..1_000_u64 {
                let k = (t * 101 + i) % 1_024;
                match i % 5 {
                    0 | 1 => cache.set(k, i as i64),
                    2 => {
                        cache.get(&k);
                    }
                    3 => cache.set_if_absent(k, -1),
                    _ => {
                        cache.delete(&k);
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    cache.check_invariants().unwrap();
    for stats in cache.shard_stats() {
        assert!(stats.size <= stats.capacity);
    }
}

#[test]
fn loader_fans_out_across_shards_under_threads() {
    let cache: ShardedLruCache<u64, i64> = ShardedLruCache::new(4, 4_096);
    cache.on_miss(|k: &u64| Some(Arc::new(*k as i64 + 7)));

    let mut handles = Vec::new();
    for t in 0..4_u64 {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            for i in 0..500_u64 {
                let k = t * 500 + i;
                assert_eq!(cache.get(&k).as_deref(), Some(&(k as i64 + 7)));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.length(), 2_000);
    cache.check_invariants().unwrap();
}

#[test]
fn stats_json_aggregates_the_router() {
    let cache: ShardedLruCache<u64, i64> = ShardedLruCache::new(4, 100);
    cache.set(1, 1);
    cache.set(2, 2);

    assert_eq!(
        cache.stats_json(),
        "{\"Length\": 2, \"Size\": 2, \"Capacity\": 100}"
    );
    assert_eq!(stats_json::<ShardedLruCache<u64, i64>>(None), "{}");
}

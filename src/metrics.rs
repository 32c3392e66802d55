//! Per-engine operation counters, enabled by the `metrics` cargo feature.
//!
//! Counters are plain `u64` fields updated inside the engine while its lock
//! is already held, so no atomics are needed. [`CacheMetricsSnapshot`] copies
//! them out together with the length/size/capacity gauges; sharded caches
//! [`merge`](CacheMetricsSnapshot::merge) one snapshot per shard.

/// Internal counter block owned by each `LruCore`.
#[derive(Debug, Default, Clone)]
pub(crate) struct EngineMetrics {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub miss_loads: u64,
    pub set_calls: u64,
    pub set_new: u64,
    pub set_updates: u64,
    pub evictions: u64,
    pub deletes: u64,
    pub clears: u64,
}

impl EngineMetrics {
    pub fn record_get_call(&mut self) {
        self.get_calls += 1;
    }

    pub fn record_get_hit(&mut self) {
        self.get_hits += 1;
    }

    pub fn record_get_miss(&mut self) {
        self.get_misses += 1;
    }

    pub fn record_miss_load(&mut self) {
        self.miss_loads += 1;
    }

    pub fn record_set_call(&mut self) {
        self.set_calls += 1;
    }

    pub fn record_set_new(&mut self) {
        self.set_new += 1;
    }

    pub fn record_set_update(&mut self) {
        self.set_updates += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_clear(&mut self) {
        self.clears += 1;
    }
}

/// Point-in-time copy of one engine's counters (or a merge over shards).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub miss_loads: u64,
    pub set_calls: u64,
    pub set_new: u64,
    pub set_updates: u64,
    pub evictions: u64,
    pub deletes: u64,
    pub clears: u64,
    /// Entries held when the snapshot was taken.
    pub length: usize,
    /// Running size when the snapshot was taken.
    pub size: i64,
    /// Capacity when the snapshot was taken.
    pub capacity: i64,
}

impl CacheMetricsSnapshot {
    /// Folds another shard's snapshot into this one. Counters and gauges sum.
    pub fn merge(&mut self, other: &CacheMetricsSnapshot) {
        self.get_calls += other.get_calls;
        self.get_hits += other.get_hits;
        self.get_misses += other.get_misses;
        self.miss_loads += other.miss_loads;
        self.set_calls += other.set_calls;
        self.set_new += other.set_new;
        self.set_updates += other.set_updates;
        self.evictions += other.evictions;
        self.deletes += other.deletes;
        self.clears += other.clears;
        self.length += other.length;
        self.size += other.size;
        self.capacity += other.capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_counters_and_gauges() {
        let mut a = CacheMetricsSnapshot {
            get_calls: 3,
            get_hits: 2,
            length: 4,
            size: 10,
            capacity: 25,
            ..Default::default()
        };
        let b = CacheMetricsSnapshot {
            get_calls: 1,
            get_misses: 1,
            length: 1,
            size: 5,
            capacity: 25,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.get_calls, 4);
        assert_eq!(a.get_hits, 2);
        assert_eq!(a.get_misses, 1);
        assert_eq!(a.length, 5);
        assert_eq!(a.size, 15);
        assert_eq!(a.capacity, 50);
    }
}

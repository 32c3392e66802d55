//! # Sharded LRU Router
//!
//! Splits one logical cache across N independent [`LruCache`] engines to cut
//! lock contention: operations on keys that hash to different shards never
//! touch the same mutex.
//!
//! ```text
//!                       ShardedLruCache<K, V>
//!                               │
//!              hash(seed, key) % shards  (ShardSelector)
//!          ┌───────────┬───────┴───┬───────────┐
//!          ▼           ▼           ▼           ▼
//!     ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐
//!     │LruCache │ │LruCache │ │LruCache │ │LruCache │
//!     │ cap/N   │ │ cap/N   │ │ cap/N   │ │ cap/N+r │
//!     └─────────┘ └─────────┘ └─────────┘ └─────────┘
//! ```
//!
//! The total capacity is divided with [`split_capacity`]: equal integer
//! shares, division remainder folded into the last shard, so the shard
//! budgets always sum to the requested total. [`set_capacity`] redistributes
//! with the same rule.
//!
//! ## Semantics vs. a single engine
//!
//! Each shard evicts against its own budget, so the router can evict while
//! other shards still have headroom, and the global recency order is only
//! approximate (each shard keeps its own). Whole-cache operations (`clear`,
//! `keys`, `length`, ...) visit shards in index order without a global lock:
//! the aggregate is a consistent-per-shard composite, not a single atomic
//! snapshot. Per-key operations keep their exact single-engine semantics,
//! purge notifications included, because a key always routes to the same
//! shard.
//!
//! [`set_capacity`]: ShardedLruCache::set_capacity

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::ds::{split_capacity, ShardSelector};
use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::CacheMetricsSnapshot;
use crate::policy::lru::LruCache;
use crate::stats::{CacheStats, StatsSource};
use crate::traits::{Cache, Cacheable, Item, MissHandler};

/// Cache router distributing keys across independent LRU shards.
///
/// Implements the same [`Cache`] contract as a single [`LruCache`];
/// aggregates (`length`, `size`, `capacity`, `stats`) sum over the shards.
/// Cloning is shallow and shares the underlying shards.
///
/// # Example
///
/// ```
/// use lrukit::policy::sharded::ShardedLruCache;
/// use lrukit::traits::Cache;
///
/// let cache: ShardedLruCache<String, i64> = ShardedLruCache::new(4, 100);
/// assert_eq!(cache.shard_count(), 4);
/// assert_eq!(cache.capacity(), 100);
///
/// cache.set("a".to_string(), 1);
/// assert_eq!(cache.get(&"a".to_string()).as_deref(), Some(&1));
/// ```
pub struct ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    selector: ShardSelector,
    shards: Vec<LruCache<K, V>>,
}

impl<K, V> Clone for ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn clone(&self) -> Self {
        Self {
            selector: ShardSelector::new(self.selector.shard_count(), Self::SEED),
            shards: self.shards.clone(),
        }
    }
}

impl<K, V> fmt::Debug for ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedLruCache")
            .field("shards", &self.shards.len())
            .field("length", &self.length())
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<K, V> ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    // Fixed routing seed: every handle to the same logical cache must agree
    // on the key→shard mapping.
    const SEED: u64 = 0;

    /// Creates a router with `shard_count` shards sharing `capacity` size
    /// units. A shard count of 0 is treated as 1.
    pub fn new(shard_count: usize, capacity: i64) -> Self {
        let allotments = split_capacity(capacity, shard_count);
        let shards = allotments.iter().map(|&cap| LruCache::new(cap)).collect();
        ShardedLruCache {
            selector: ShardSelector::new(allotments.len(), Self::SEED),
            shards,
        }
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Per-shard stats in shard index order.
    pub fn shard_stats(&self) -> Vec<CacheStats> {
        self.shards.iter().map(|shard| shard.stats()).collect()
    }

    /// Runs every shard's invariant check, failing on the first violation.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        for shard in &self.shards {
            shard.check_invariants()?;
        }
        Ok(())
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        let mut merged = CacheMetricsSnapshot::default();
        for shard in &self.shards {
            merged.merge(&shard.metrics_snapshot());
        }
        merged
    }

    fn shard_for(&self, key: &K) -> &LruCache<K, V> {
        &self.shards[self.selector.shard_for_key(key)]
    }
}

impl<K, V> StatsSource for ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn stats(&self) -> CacheStats {
        let mut total = CacheStats::default();
        for shard in &self.shards {
            let stats = shard.stats();
            total.length += stats.length;
            total.size += stats.size;
            total.capacity += stats.capacity;
        }
        total
    }
}

impl<K, V> Cache<K, V> for ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.shard_for(key).get(key)
    }

    fn set_arc(&self, key: K, value: Arc<V>) {
        self.shards[self.selector.shard_for_key(&key)].set_arc(key, value);
    }

    fn set_if_absent_arc(&self, key: K, value: Arc<V>) {
        self.shards[self.selector.shard_for_key(&key)].set_if_absent_arc(key, value);
    }

    fn delete(&self, key: &K) -> bool {
        self.shard_for(key).delete(key)
    }

    fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
    }

    /// Redistributes `capacity` across the shards with the same split rule
    /// used at construction; shards over their new budget evict immediately.
    fn set_capacity(&self, capacity: i64) {
        let allotments = split_capacity(capacity, self.shards.len());
        for (shard, cap) in self.shards.iter().zip(allotments) {
            shard.set_capacity(cap);
        }
    }

    /// Registers one loader shared by every shard. The loader may be invoked
    /// concurrently from different shards.
    fn on_miss<F>(&self, loader: F)
    where
        F: Fn(&K) -> Option<Arc<V>> + Send + Sync + 'static,
    {
        let handler: MissHandler<K, V> = Arc::new(loader);
        for shard in &self.shards {
            shard.on_miss_handler(Arc::clone(&handler));
        }
    }

    fn keys(&self) -> Vec<K> {
        let mut keys = Vec::new();
        for shard in &self.shards {
            keys.extend(shard.keys());
        }
        keys
    }

    fn values(&self) -> Vec<Arc<V>> {
        let mut values = Vec::new();
        for shard in &self.shards {
            values.extend(shard.values());
        }
        values
    }

    fn items(&self) -> Vec<Item<K, V>> {
        let mut items = Vec::new();
        for shard in &self.shards {
            items.extend(shard.items());
        }
        items
    }

    fn length(&self) -> i64 {
        self.shards.iter().map(|shard| shard.length()).sum()
    }

    fn size(&self) -> i64 {
        self.shards.iter().map(|shard| shard.size()).sum()
    }

    fn capacity(&self) -> i64 {
        self.shards.iter().map(|shard| shard.capacity()).sum()
    }
}

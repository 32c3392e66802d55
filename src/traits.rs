//! # Cache Call Contract and Value Capabilities
//!
//! This module defines the public contract shared by every cache front in the
//! library, and the capability trait cached values use to participate in
//! size accounting and purge notification.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌─────────────────────────────────────────┐
//!                  │              Cache<K, V>                │
//!                  │                                         │
//!                  │  get(&K) → Option<Arc<V>>               │
//!                  │  set(K, V) / set_arc(K, Arc<V>)         │
//!                  │  set_if_absent(K, V)                    │
//!                  │  delete(&K) → bool                      │
//!                  │  clear() / set_capacity(i64)            │
//!                  │  on_miss(loader)                        │
//!                  │  keys() / values() / items()            │
//!                  │  length() / size() / capacity()         │
//!                  └──────────┬─────────────────┬────────────┘
//!                             │                 │
//!                             ▼                 ▼
//!                   LruCache<K, V>      ShardedLruCache<K, V>
//!                   (one lock, one      (N engines, key-hash
//!                    recency order)      routed, aggregates)
//! ```
//!
//! ## Value Capabilities
//!
//! | Capability         | Method                 | Default            |
//! |--------------------|------------------------|--------------------|
//! | Reports own size   | `Cacheable::size`      | `1`                |
//! | Observes its purge | `Cacheable::on_purge`  | no-op              |
//!
//! A value that overrides neither behaves as a unit-size, non-notified entry.
//! Size is read once per insert/update and trusted for the lifetime of the
//! entry; the cache never re-measures.
//!
//! ## Purge Reasons
//!
//! | Reason      | Cause                                              |
//! |-------------|----------------------------------------------------|
//! | `CacheFull` | evicted from the LRU end to satisfy capacity       |
//! | `Delete`    | explicit `delete(&k)`                              |
//! | `Update`    | a newer `set` replaced the value (old one notified)|
//! | `ClearAll`  | bulk `clear()`                                     |

use std::sync::Arc;

use crate::stats::StatsSource;

/// Why an entry was removed from the cache.
///
/// Passed to [`Cacheable::on_purge`] exactly once per removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurgeReason {
    /// The cache grew past its capacity and this was the least recently used
    /// entry.
    CacheFull,
    /// The entry was explicitly removed with `delete`.
    Delete,
    /// A new value was stored under the same key; the superseded value is the
    /// one notified, never the new one.
    Update,
    /// `clear` removed every entry.
    ClearAll,
}

/// Capability trait for cached values.
///
/// Both methods have defaults, so any value type becomes cacheable with an
/// empty impl. Override [`size`](Cacheable::size) to weight entries against
/// the cache capacity, and [`on_purge`](Cacheable::on_purge) to observe
/// removal.
///
/// `on_purge` runs synchronously while the owning engine's lock is held. It
/// must not call back into the same cache instance (the lock is not
/// reentrant), and the value must not change its reported size while cached.
///
/// # Example
///
/// ```
/// use lrukit::traits::{Cacheable, PurgeReason};
///
/// struct Page(Vec<u8>);
///
/// impl Cacheable for Page {
///     fn size(&self) -> i64 {
///         self.0.len() as i64
///     }
/// }
///
/// assert_eq!(Page(vec![0; 32]).size(), 32);
/// // Unit-size default for types that don't override:
/// assert_eq!(7_u64.size(), 1);
/// ```
pub trait Cacheable {
    /// Size of this value in abstract capacity units.
    ///
    /// Read once when the value is inserted or updated; report a constant.
    fn size(&self) -> i64 {
        1
    }

    /// Called exactly once when this value leaves the cache.
    fn on_purge(&self, _reason: PurgeReason) {}
}

macro_rules! impl_unit_cacheable {
    ($($t:ty),* $(,)?) => {
        $(impl Cacheable for $t {})*
    };
}

impl_unit_cacheable!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
);

impl<'a> Cacheable for &'a str {}
impl Cacheable for Vec<u8> {}

/// Shared miss loader invoked on `get` of an unindexed key.
///
/// Runs synchronously under the engine lock; a slow loader stalls every other
/// caller of that engine (one shard, under the router) until it returns.
/// `None` means "not found" and nothing is inserted.
pub type MissHandler<K, V> = Arc<dyn Fn(&K) -> Option<Arc<V>> + Send + Sync>;

/// One `items()` snapshot element.
#[derive(Debug, Clone)]
pub struct Item<K, V> {
    pub key: K,
    pub value: Arc<V>,
}

/// Call contract shared by [`LruCache`](crate::policy::lru::LruCache) and
/// [`ShardedLruCache`](crate::policy::sharded::ShardedLruCache).
///
/// All methods take `&self`: implementations are internally locked, and every
/// operation is atomic with respect to the engine it lands on. Lookup misses
/// and absent-key deletes are normal outcomes, not errors.
///
/// # Example
///
/// ```
/// use lrukit::policy::lru::LruCache;
/// use lrukit::traits::Cache;
///
/// let cache: LruCache<u64, String> = LruCache::new(100);
/// cache.set(1, "one".to_string());
/// cache.set(2, "two".to_string());
///
/// assert_eq!(cache.get(&1).as_deref(), Some(&"one".to_string()));
/// // Most recently used first:
/// assert_eq!(cache.keys(), vec![1, 2]);
/// assert!(cache.delete(&2));
/// assert!(!cache.delete(&2));
/// ```
pub trait Cache<K, V>: StatsSource {
    /// Looks up `key`, promoting it to most recently used on a hit.
    ///
    /// On a miss with a registered loader, the loader runs under the lock; a
    /// `Some` result is inserted as if by [`set`](Cache::set) and returned
    /// (it may be evicted again within the same call if it overflows
    /// capacity).
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Inserts or replaces the value for `key`, then enforces capacity.
    ///
    /// Replacement fires a [`PurgeReason::Update`] notification on the old
    /// value and re-reads the size from the new one.
    fn set(&self, key: K, value: V)
    where
        V: Sized,
    {
        self.set_arc(key, Arc::new(value));
    }

    /// [`set`](Cache::set) for a value that is already `Arc`-wrapped.
    fn set_arc(&self, key: K, value: Arc<V>);

    /// Inserts only if `key` is absent; otherwise promotes the existing entry
    /// and silently discards `value` (no purge fires, size is untouched).
    fn set_if_absent(&self, key: K, value: V)
    where
        V: Sized,
    {
        self.set_if_absent_arc(key, Arc::new(value));
    }

    /// [`set_if_absent`](Cache::set_if_absent) for an `Arc`-wrapped value.
    fn set_if_absent_arc(&self, key: K, value: Arc<V>);

    /// Removes `key`, firing [`PurgeReason::Delete`] if it existed.
    ///
    /// Returns whether the key was present.
    fn delete(&self, key: &K) -> bool;

    /// Removes every entry, firing [`PurgeReason::ClearAll`] per entry
    /// (scanning MRU to LRU) before the structure is emptied.
    fn clear(&self);

    /// Replaces the capacity and evicts from the LRU end until the running
    /// size fits. Zero or negative capacity is accepted and empties the
    /// cache.
    fn set_capacity(&self, capacity: i64);

    /// Registers the miss loader consulted by [`get`](Cache::get).
    fn on_miss<F>(&self, loader: F)
    where
        F: Fn(&K) -> Option<Arc<V>> + Send + Sync + 'static;

    /// Snapshot of the keys, most recently used first.
    fn keys(&self) -> Vec<K>;

    /// Snapshot of the values, most recently used first.
    fn values(&self) -> Vec<Arc<V>>;

    /// Snapshot of key/value pairs, most recently used first.
    fn items(&self) -> Vec<Item<K, V>>;

    /// Number of entries currently held.
    fn length(&self) -> i64;

    /// Running sum of the entries' reported sizes.
    fn size(&self) -> i64;

    /// The configured size budget.
    fn capacity(&self) -> i64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_size_is_one() {
        assert_eq!(42_i32.size(), 1);
        assert_eq!("hello".size(), 1);
        assert_eq!(String::from("hello").size(), 1);
        assert_eq!(vec![0_u8; 128].size(), 1);
    }

    #[test]
    fn default_on_purge_is_a_no_op() {
        // Must not panic or otherwise misbehave.
        7_u64.on_purge(PurgeReason::CacheFull);
        7_u64.on_purge(PurgeReason::ClearAll);
    }

    #[test]
    fn size_override_wins() {
        struct Weighted(i64);
        impl Cacheable for Weighted {
            fn size(&self) -> i64 {
                self.0
            }
        }
        assert_eq!(Weighted(17).size(), 17);
    }

    #[test]
    fn purge_reason_is_hashable_and_comparable() {
        use std::collections::HashSet;
        let mut reasons = HashSet::new();
        reasons.insert(PurgeReason::CacheFull);
        reasons.insert(PurgeReason::Delete);
        reasons.insert(PurgeReason::Update);
        reasons.insert(PurgeReason::ClearAll);
        assert_eq!(reasons.len(), 4);
    }
}

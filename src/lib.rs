//! lrukit: size-bounded LRU caching with purge notifications and sharding.
//!
//! The core type is [`policy::lru::LruCore`], a capacity-bounded mapping with
//! O(1) get/set/delete and recency-ordered eviction. Capacity is a budget in
//! abstract size units reported by the cached values themselves, not an item
//! count. [`policy::lru::LruCache`] wraps the core in a single exclusive lock
//! for concurrent use, and [`policy::sharded::ShardedLruCache`] partitions the
//! key space across independently locked engines to reduce contention.
//!
//! Cached values opt into two capabilities through [`traits::Cacheable`]:
//! reporting their own size (default 1) and observing the reason they were
//! purged (default no-op).

pub mod ds;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod stats;
pub mod traits;

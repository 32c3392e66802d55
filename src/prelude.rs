//! Convenience re-exports for common usage.
//!
//! ```
//! use lrukit::prelude::*;
//! ```

pub use crate::ds::{split_capacity, ShardSelector};
pub use crate::error::InvariantError;
#[cfg(feature = "metrics")]
pub use crate::metrics::CacheMetricsSnapshot;
pub use crate::policy::lru::LruCore;
#[cfg(feature = "concurrency")]
pub use crate::policy::lru::LruCache;
#[cfg(feature = "concurrency")]
pub use crate::policy::sharded::ShardedLruCache;
pub use crate::stats::{stats_json, CacheStats, StatsSource};
pub use crate::traits::{Cache, Cacheable, Item, MissHandler, PurgeReason};

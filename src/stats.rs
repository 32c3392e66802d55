//! Cache statistics: the length/size/capacity triple and its JSON rendering.
//!
//! Every cache front reports the same three numbers. For a sharded cache the
//! triple is summed across shards, each read under that shard's own lock, so
//! the aggregate is not a single atomic snapshot of the whole router.

/// Point-in-time statistics for one cache (or the sum over shards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of entries held.
    pub length: i64,
    /// Running sum of entry sizes.
    pub size: i64,
    /// Configured size budget.
    pub capacity: i64,
}

impl CacheStats {
    /// Renders the triple as a small JSON object.
    ///
    /// # Example
    ///
    /// ```
    /// use lrukit::stats::CacheStats;
    ///
    /// let stats = CacheStats { length: 3, size: 5, capacity: 10 };
    /// assert_eq!(
    ///     stats.to_json(),
    ///     r#"{"Length": 3, "Size": 5, "Capacity": 10}"#
    /// );
    /// ```
    pub fn to_json(&self) -> String {
        format!(
            "{{\"Length\": {}, \"Size\": {}, \"Capacity\": {}}}",
            self.length, self.size, self.capacity
        )
    }
}

/// Anything that can report a [`CacheStats`] triple.
pub trait StatsSource {
    /// Current statistics.
    fn stats(&self) -> CacheStats;

    /// Statistics rendered as JSON.
    fn stats_json(&self) -> String {
        self.stats().to_json()
    }
}

/// JSON statistics for a cache that may not exist yet.
///
/// Degrades to `"{}"` for `None` instead of faulting, so callers can wire
/// stats endpoints before the cache is constructed.
///
/// # Example
///
/// ```
/// use lrukit::policy::lru::LruCache;
/// use lrukit::stats::stats_json;
///
/// let absent: Option<&LruCache<u64, String>> = None;
/// assert_eq!(stats_json(absent), "{}");
/// ```
pub fn stats_json<S: StatsSource>(cache: Option<&S>) -> String {
    match cache {
        Some(cache) => cache.stats_json(),
        None => "{}".to_string(),
    }
}

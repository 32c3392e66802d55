//! Shard selection and capacity distribution for sharded caches.
//!
//! [`ShardSelector`] provides the deterministic key→shard mapping used by
//! [`ShardedLruCache`](crate::policy::sharded::ShardedLruCache);
//! [`split_capacity`] divides a total size budget across shards.
//!
//! ```text
//! Input Key ──► hash(seed, key) % shards ──► shard index
//!
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ Shard 0 │ Shard 1 │ Shard 2 │ Shard 3 │
//!   │ cap/4   │ cap/4   │ cap/4   │ cap/4+r │   r = cap % 4
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! Properties:
//! - Deterministic: the same `(key, seed, shards)` always yields the same
//!   shard, so an entry is only ever looked up where it was stored.
//! - Seed isolation: different seeds produce different distributions.
//! - The shard capacities always sum to the requested total; which shard
//!   absorbs the division remainder is a policy detail callers must not rely
//!   on (currently the last).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic shard selector using a seeded hash.
///
/// Maps any `Hash`able key to a shard index in `[0, shards)`.
///
/// # Example
///
/// ```
/// use lrukit::ds::ShardSelector;
///
/// let selector = ShardSelector::new(4, 0);
/// let shard = selector.shard_for_key(&"user:123");
/// assert!(shard < 4);
/// assert_eq!(selector.shard_for_key(&"user:123"), shard);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
    seed: u64,
}

impl ShardSelector {
    /// Creates a selector for `shards` shards with the given `seed`.
    ///
    /// The shard count is clamped to at least 1.
    pub fn new(shards: usize, seed: u64) -> Self {
        Self {
            shards: shards.max(1),
            seed,
        }
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Maps a key to a shard index in `[0, shards)`.
    pub fn shard_for_key<K: Hash>(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards
    }
}

impl Default for ShardSelector {
    /// Creates a single-shard selector with seed 0.
    fn default() -> Self {
        Self::new(1, 0)
    }
}

/// Divides `total` capacity across `shards` shards.
///
/// Integer division assigns each shard an equal allotment; the remainder is
/// folded into the last shard so the pieces always sum to `total`. A shard
/// count of 0 is treated as 1. Negative totals split the same way (and leave
/// every shard aggressively evicting).
///
/// # Example
///
/// ```
/// use lrukit::ds::split_capacity;
///
/// assert_eq!(split_capacity(100, 4), vec![25, 25, 25, 25]);
/// assert_eq!(split_capacity(103, 4), vec![25, 25, 25, 28]);
/// assert_eq!(split_capacity(10, 0), vec![10]);
/// ```
pub fn split_capacity(total: i64, shards: usize) -> Vec<i64> {
    let shards = shards.max(1);
    let per_shard = total / shards as i64;
    let remainder = total - per_shard * shards as i64;
    let mut allotments = vec![per_shard; shards];
    if let Some(last) = allotments.last_mut() {
        *last += remainder;
    }
    allotments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_selector_is_deterministic() {
        let selector = ShardSelector::new(8, 123);

        let a = selector.shard_for_key(&"key");
        let b = selector.shard_for_key(&"key");
        assert_eq!(a, b);
        assert!(a < selector.shard_count());
    }

    #[test]
    fn zero_shards_is_clamped_to_one() {
        let selector = ShardSelector::new(0, 0);
        assert_eq!(selector.shard_count(), 1);
        assert_eq!(selector.shard_for_key(&42_u64), 0);
    }

    #[test]
    fn split_sums_to_total() {
        for shards in 1..10 {
            for total in [0_i64, 1, 7, 100, 103, 1000] {
                let parts = split_capacity(total, shards);
                assert_eq!(parts.len(), shards);
                assert_eq!(parts.iter().sum::<i64>(), total);
            }
        }
    }

    #[test]
    fn remainder_goes_to_last_shard() {
        assert_eq!(split_capacity(10, 3), vec![3, 3, 4]);
        assert_eq!(split_capacity(11, 4), vec![2, 2, 2, 5]);
    }

    #[test]
    fn negative_total_still_sums() {
        let parts = split_capacity(-7, 4);
        assert_eq!(parts.iter().sum::<i64>(), -7);
    }
}

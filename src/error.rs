//! Error types for the lrukit library.
//!
//! The cache API itself is total: misses, absent-key deletes, and degenerate
//! capacities are normal outcomes, not errors. The only error type here is
//! [`InvariantError`], produced by the diagnostic `check_invariants` method
//! on [`LruCore`](crate::policy::lru::LruCore) when the recency list, the key
//! index, or the size accounting have drifted out of agreement.

use std::fmt;

/// Error returned when internal cache invariants are violated.
///
/// Carries a human-readable description of which invariant failed: index and
/// recency list out of bijection, a cycle in the list, or a running size that
/// no longer matches the sum of entry sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_message() {
        let err = InvariantError::new("size drifted from entry sum");
        assert_eq!(err.to_string(), "size drifted from entry sum");
        assert_eq!(err.message(), "size drifted from entry sum");
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }
}

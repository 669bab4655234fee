//! Cached value types with storage timestamps.
//!
//! A [`CacheValue`] remembers when it was stored, not when it expires.
//! Freshness is decided at read time against a TTL supplied by the reader,
//! which lets callers with different freshness requirements share a single
//! entry:
//!
//! ```
//! use std::time::Duration;
//! use ginku_core::{CacheState, CacheValue};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let value = CacheValue::new(vec!["L1", "L2"]);
//!
//! match value.cache_state(Duration::from_secs(60)) {
//!     CacheState::Actual(v) => assert_eq!(v.data(), &vec!["L1", "L2"]),
//!     CacheState::Expired(_) => unreachable!("just stored"),
//! }
//! # }
//! ```
//!
//! Timestamps use [`tokio::time::Instant`], so tests running on a paused
//! runtime clock can move entries across their TTL deterministically.

use std::time::Duration;

use tokio::time::Instant;

/// Freshness state of cached data relative to a reader's TTL.
#[derive(Debug, PartialEq, Eq)]
pub enum CacheState<Cached> {
    /// Data is younger than the TTL.
    Actual(Cached),
    /// Data is as old as the TTL or older and must be fetched again.
    Expired(Cached),
}

/// A cached value with the instant it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue<T> {
    data: T,
    stored_at: Instant,
}

impl<T> CacheValue<T> {
    /// Wraps `data`, stamping it with the current instant.
    pub fn new(data: T) -> Self {
        Self::with_stored_at(data, Instant::now())
    }

    /// Wraps `data` with an explicit storage instant.
    pub fn with_stored_at(data: T, stored_at: Instant) -> Self {
        CacheValue { data, stored_at }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns when the data was stored.
    #[inline]
    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }

    /// Time elapsed since the data was stored.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.stored_at)
    }

    /// Whether the entry is still valid for a reader using `ttl`.
    ///
    /// Valid iff `now - stored_at < ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    /// Consumes the cache value and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Classifies the value against `ttl`, keeping the value either way.
    pub fn cache_state(self, ttl: Duration) -> CacheState<Self> {
        if self.is_fresh(ttl) {
            CacheState::Actual(self)
        } else {
            CacheState::Expired(self)
        }
    }
}

#![warn(missing_docs)]
//! # ginku
//!
//! Fetch-with-cache orchestration for the Ginku transit proxy.
//!
//! [`Cache`] sits between request handlers and an upstream API. For every
//! request it either returns a fresh cached value, joins an upstream call
//! already in flight for the same key, or starts a new upstream call whose
//! result is cached on success.
//!
//! ```
//! use std::time::Duration;
//! use ginku::{Cache, CacheKey, CachePolicy, CacheStatus};
//!
//! # #[derive(Debug, Clone)] struct Unreachable;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: Cache<Vec<&'static str>, Unreachable> =
//!     Cache::new(CachePolicy::new(Duration::from_secs(60)));
//!
//! let lines = || async { Ok::<_, Unreachable>(vec!["L1", "L2"]) };
//! let first = cache.fetch(CacheKey::from("lines"), lines, None).await.unwrap();
//! assert_eq!(first.status(), CacheStatus::Miss);
//!
//! let lines = || async { Ok::<_, Unreachable>(vec!["never", "called"]) };
//! let second = cache.fetch(CacheKey::from("lines"), lines, None).await.unwrap();
//! assert_eq!(second.status(), CacheStatus::Hit);
//! assert_eq!(second.into_inner(), vec!["L1", "L2"]);
//! # }
//! ```

/// The fetch-with-cache orchestrator.
///
/// Owns the cache store and the in-flight tracker; it is the only writer of
/// either.
pub mod cache;

/// Error types for orchestrated fetches.
///
/// Defines [`CacheError`] which covers:
/// - Upstream errors produced by the fetcher
/// - Aborted fetch tasks
/// - Callers that stopped waiting
pub mod error;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters
/// for hits, misses and joined requests, and a histogram of upstream call
/// durations.
pub mod metrics;

/// TTL policy.
pub mod policy;

mod inflight;
mod store;

pub use cache::{Cache, Fetched};
pub use error::CacheError;
pub use policy::CachePolicy;

pub use ginku_core::{CacheKey, CacheState, CacheStatus, CacheValue, Fetcher, KeyPart, KeyParts};

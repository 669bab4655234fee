#![warn(missing_docs)]
//! # ginku-core
//!
//! Core types for the Ginku caching proxy.
//!
//! This crate holds the small vocabulary shared by the cache orchestrator
//! (`ginku`) and the HTTP server (`ginku-server`):
//!
//! - **Identify** cached data ([`CacheKey`], [`KeyPart`], [`KeyParts`])
//! - **Timestamp** cached data ([`CacheValue`], [`CacheState`])
//! - **Report** how a value was obtained ([`CacheStatus`])
//! - **Produce** values on a miss ([`Fetcher`])

pub mod fetcher;
pub mod key;
pub mod status;
pub mod value;

pub use fetcher::Fetcher;
pub use key::{CacheKey, KeyPart, KeyParts};
pub use status::CacheStatus;
pub use value::{CacheState, CacheValue};

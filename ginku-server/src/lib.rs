//! Caching reverse proxy for the Ginko transit API.
//!
//! The proxy exposes a handful of read-only endpoints, each backed by one
//! upstream [`Operation`]. Responses are cached per operation and parameters
//! by a [`ginku::Cache`]: concurrent requests for the same resource share a
//! single upstream call, and failures are never cached.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod operation;
pub mod routes;
pub mod state;

pub use config::{Config, Ttls};
pub use error::ServerError;
pub use operation::{Freshness, Operation, UpstreamRequest};
pub use routes::router;
pub use state::{AppState, ResponseCache};

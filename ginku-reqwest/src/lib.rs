//! Client for the Ginko transit API.
//!
//! [`UpstreamClient`] issues GET calls against one upstream base URL, attaches
//! the shared API key as the `apiKey` query parameter, unwraps the `objets`
//! envelope the API nests every payload under and checks that the payload
//! has the expected [`Shape`].
//!
//! Failures are reported as [`UpstreamError`], which is cheap to clone so that
//! one outcome can be handed to every caller coalesced on the same call.

mod client;
mod error;

pub use client::{ApiKey, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, Shape, UpstreamClient};
pub use error::UpstreamError;

/// Re-export of the URL type accepted by [`UpstreamClient::new`].
pub use reqwest::Url;

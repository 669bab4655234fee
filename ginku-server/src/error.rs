//! Mapping of failed fetches to HTTP responses.

use axum::Json;
use axum::response::{IntoResponse, Response};
use ginku::{CacheError, CacheKey};
use ginku_reqwest::UpstreamError;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::operation::Operation;

/// A request that could not be served.
#[derive(Debug, Error)]
#[error("{operation} failed for `{key}`: {source}")]
pub struct ServerError {
    operation: Operation,
    key: CacheKey,
    #[source]
    source: CacheError<UpstreamError>,
}

impl ServerError {
    /// Wraps the failure of `operation` for `key`.
    pub fn new(operation: Operation, key: CacheKey, source: CacheError<UpstreamError>) -> Self {
        Self {
            operation,
            key,
            source,
        }
    }

    /// Status code and machine-readable code sent to the client.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.source {
            CacheError::Upstream(UpstreamError::Transport { .. }) => {
                (StatusCode::BAD_GATEWAY, "upstream_unavailable")
            }
            CacheError::Upstream(UpstreamError::Status { .. }) => {
                (StatusCode::BAD_GATEWAY, "upstream_status")
            }
            CacheError::Upstream(UpstreamError::Malformed { .. }) => {
                (StatusCode::BAD_GATEWAY, "malformed_upstream_response")
            }
            CacheError::Upstream(UpstreamError::InvalidPath { .. })
            | CacheError::Aborted { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            CacheError::Cancelled { .. } => (StatusCode::SERVICE_UNAVAILABLE, "shutting_down"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let operation = self.operation.name();
        let key = &self.key;

        match &self.source {
            CacheError::Cancelled { .. } => debug!(operation, %key, "request cancelled"),
            CacheError::Upstream(source) => {
                warn!(operation, %key, code, error = %source, "upstream call failed")
            }
            CacheError::Aborted { reason, .. } => {
                error!(operation, %key, %reason, "upstream fetch task aborted")
            }
        }

        let body = json!({
            "error": code,
            "message": self.source.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

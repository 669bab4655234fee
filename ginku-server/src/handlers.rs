//! One handler per proxied resource.
//!
//! Each handler binds its path parameters to an [`Operation`] and delegates to
//! [`proxy`], which serves the payload from the cache or from upstream.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use ginku::Fetched;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::ServerError;
use crate::operation::{Operation, UpstreamRequest};
use crate::state::AppState;

/// Response header reporting how the payload was obtained.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// Serves `request` through the cache.
///
/// Fresh entries are still served during shutdown. A request that would wait
/// on upstream gives up with `503` instead, while the upstream call itself
/// keeps running for any other caller joined on it.
pub async fn proxy(state: &AppState, request: UpstreamRequest) -> Result<Response, ServerError> {
    let operation = request.operation();
    let key = request.cache_key();
    let ttl = state.ttl_override(operation.freshness());
    let client = state.client().clone();
    let fetcher = move || request.fetch(client);

    let fetched = state
        .cache()
        .fetch_cancellable(key.clone(), fetcher, ttl, state.cancelled())
        .await
        .map_err(|source| ServerError::new(operation, key.clone(), source))?;

    debug!(operation = operation.name(), %key, status = fetched.status().as_str(), "served");
    Ok(json_response(fetched))
}

fn json_response(fetched: Fetched<Bytes>) -> Response {
    let status = HeaderValue::from_static(fetched.status().as_header_value());
    (
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (CACHE_STATUS_HEADER, status),
        ],
        fetched.into_inner(),
    )
        .into_response()
}

pub async fn search(State(state): State<AppState>) -> Result<Response, ServerError> {
    proxy(&state, UpstreamRequest::new(Operation::Stops, NO_ARGS)).await
}

pub async fn vehicle_details(
    State(state): State<AppState>,
    Path(num): Path<String>,
) -> Result<Response, ServerError> {
    proxy(&state, UpstreamRequest::new(Operation::VehicleDetails, [num])).await
}

pub async fn lines(State(state): State<AppState>) -> Result<Response, ServerError> {
    proxy(&state, UpstreamRequest::new(Operation::Lines, NO_ARGS)).await
}

pub async fn variant_stops(
    State(state): State<AppState>,
    Path((id_ligne, id_variante)): Path<(String, String)>,
) -> Result<Response, ServerError> {
    let request = UpstreamRequest::new(Operation::VariantStops, [id_ligne, id_variante]);
    proxy(&state, request).await
}

pub async fn stop_variants(
    State(state): State<AppState>,
    Path(id_arret): Path<String>,
) -> Result<Response, ServerError> {
    proxy(&state, UpstreamRequest::new(Operation::StopVariants, [id_arret])).await
}

pub async fn wait_times(
    State(state): State<AppState>,
    Path(nom): Path<String>,
) -> Result<Response, ServerError> {
    proxy(&state, UpstreamRequest::new(Operation::WaitTimes, [nom])).await
}

pub async fn line_status(State(state): State<AppState>) -> Result<Response, ServerError> {
    proxy(&state, UpstreamRequest::new(Operation::LineStatus, NO_ARGS)).await
}

pub async fn line_messages(
    State(state): State<AppState>,
    Path(id_ligne): Path<String>,
) -> Result<Response, ServerError> {
    proxy(&state, UpstreamRequest::new(Operation::LineMessages, [id_ligne])).await
}

pub async fn health() -> &'static str {
    "ok"
}

const NO_ARGS: [&str; 0] = [];

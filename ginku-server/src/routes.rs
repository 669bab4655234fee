use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the HTTP surface of the proxy.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/search", get(handlers::search))
        .route("/detailsVehicule/{num}", get(handlers::vehicle_details))
        // Misspelling kept: it is the path the front end calls.
        .route("/getLingnes", get(handlers::lines))
        .route("/getArretFromLigne/{idLigne}/{idVariante}", get(handlers::variant_stops))
        .route("/getVariantesDesservantArret/{idArret}", get(handlers::stop_variants))
        .route("/getTempsLieu/{nom}", get(handlers::wait_times))
        .route("/etatLignes", get(handlers::line_status))
        .route("/messages/{idLigne}", get(handlers::line_messages));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

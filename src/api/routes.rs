use crate::api::{handlers, AppState};
use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        // Dataset with overlays
        .route("/v1/districts", get(handlers::list_districts))
        .route("/v1/districts/:district", get(handlers::get_district))
        // Predictions
        .route("/v1/predictions", get(handlers::predictions))
        .route("/v1/predictions/crime", get(handlers::crime_predictions))
        .route("/v1/predictions/safety", get(handlers::safety_predictions))
        // Prometheus
        .route("/metrics", get(handlers::metrics))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}

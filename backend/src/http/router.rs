//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for the dashboard dev server
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Forecasts
        .route("/predictions", get(handlers::get_prediction))
        .route("/predictions/short-term", get(handlers::get_short_term))
        .route("/predictions/weekly", get(handlers::get_weekly))
        // Descriptive statistics
        .route("/statistics", get(handlers::get_statistics))
        .route("/statistics/hourly", get(handlers::get_hourly_trends))
        .route("/stops/{stop_id}/next", get(handlers::get_next_stop))
        .route("/stops/{stop_id}/history", get(handlers::get_stop_history))
        // Segment travel times
        .route("/segments", get(handlers::list_segments))
        .route("/segments/{segment_id}/predictions", get(handlers::get_segment_prediction))
        .route("/segments/{segment_id}/short-term", get(handlers::get_segment_short_term))
        .route("/segments/{segment_id}/history", get(handlers::get_segment_history))
        // Event impact
        .route("/events/impact", get(handlers::get_event_impact))
        .route("/events/{date}/comparison", get(handlers::get_event_comparison))
        // Ingestion
        .route("/observations", post(handlers::upload_observations))
        .route("/events", post(handlers::upload_events));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Observation uploads can be a full season of departures.
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

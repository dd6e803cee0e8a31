use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Meters
        .route("/api/v1/meters/validate", post(handlers::validate_meter))
        .route("/api/v1/meters/validate/batch", post(handlers::validate_batch))
        .route("/api/v1/meters/{meter_id}/anomalies", get(handlers::list_anomalies))

        // Antifraud
        .route("/api/v1/antifraud/stats", get(handlers::get_stats))
        .route("/api/v1/antifraud/cleanup", post(handlers::cleanup_history))

        // Geocoding
        .route("/api/v1/geocode", get(handlers::geocode_address))
        .route("/api/v1/geocode/reverse", get(handlers::reverse_geocode))

        .with_state(state)
}

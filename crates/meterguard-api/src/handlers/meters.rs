use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use meterguard_antifraud::ValidationVerdict;
use meterguard_core::models::{GpsAnomaly, MeterLocation};

use crate::error::ApiError;
use crate::state::AppState;

/// Largest batch accepted by `POST /api/v1/meters/validate/batch`
pub const MAX_BATCH_SIZE: usize = 500;

pub async fn validate_meter(
    State(state): State<Arc<AppState>>,
    Json(meter): Json<MeterLocation>,
) -> Result<Json<ValidationVerdict>, ApiError> {
    if meter.id.trim().is_empty() {
        return Err(ApiError::bad_request("Meter id must not be empty"));
    }

    tracing::info!(meter_id = %meter.id, "Validating meter location");
    Ok(Json(state.evaluator.validate_meter_location(&meter).await))
}

pub async fn validate_batch(
    State(state): State<Arc<AppState>>,
    Json(meters): Json<Vec<MeterLocation>>,
) -> Result<Json<Vec<ValidationVerdict>>, ApiError> {
    if meters.len() > MAX_BATCH_SIZE {
        let details = format!("{} meters submitted, limit is {}", meters.len(), MAX_BATCH_SIZE);
        return Err(ApiError::bad_request("Batch too large").with_details(details));
    }
    if let Some(position) = meters.iter().position(|m| m.id.trim().is_empty()) {
        return Err(ApiError::bad_request("Meter id must not be empty")
            .with_details(format!("entry {}", position)));
    }

    tracing::info!(count = meters.len(), "Validating meter batch");
    Ok(Json(state.evaluator.validate_batch(&meters).await))
}

pub async fn list_anomalies(
    State(state): State<Arc<AppState>>,
    Path(meter_id): Path<String>,
) -> Result<Json<Vec<GpsAnomaly>>, ApiError> {
    let history = state.evaluator.meter_history(&meter_id).await.map_err(|e| {
        tracing::error!(meter_id = %meter_id, error = %e, "Failed to read anomaly history");
        ApiError::from(e)
    })?;
    Ok(Json(history))
}

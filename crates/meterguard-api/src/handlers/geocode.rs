use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use meterguard_core::models::{Coordinates, GeocodingResult, ReverseGeocodingResult};

use crate::dto::{GeocodeParams, ReverseParams};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn geocode_address(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<Vec<GeocodingResult>>, ApiError> {
    let results = state.geocoder.geocode_address(&params.address).await.map_err(|e| {
        tracing::warn!(address = %params.address, error = %e, "Geocoding failed");
        ApiError::from(e)
    })?;
    Ok(Json(results))
}

pub async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseParams>,
) -> Result<Json<Vec<ReverseGeocodingResult>>, ApiError> {
    let coordinates = Coordinates::new(params.lat, params.lng);
    let results = state.geocoder.reverse_geocode(&coordinates).await.map_err(|e| {
        tracing::warn!(coordinates = %coordinates, error = %e, "Reverse geocoding failed");
        ApiError::from(e)
    })?;
    Ok(Json(results))
}

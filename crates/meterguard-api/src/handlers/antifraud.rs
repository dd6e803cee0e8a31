use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use meterguard_antifraud::AntifraudStats;

use crate::dto::{CleanupParams, CleanupResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AntifraudStats>, ApiError> {
    let stats = state.evaluator.antifraud_stats().await?;
    Ok(Json(stats))
}

pub async fn cleanup_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CleanupParams>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let days_to_keep = params.days.unwrap_or(state.retention_days);
    let removed = state.evaluator.clean_old_history(days_to_keep).await?;
    Ok(Json(CleanupResponse { removed, days_to_keep }))
}

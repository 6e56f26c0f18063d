//! Cleanup Scheduler endpoints: `/cleanup/...`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api_error::ApiError;
use crate::response_types::{CleanupConfigResponse, CleanupStatusResponse};
use crate::AppState;

pub async fn status(State(state): State<Arc<AppState>>) -> Json<CleanupStatusResponse> {
    let last_run = state.cleanup.last_run().await;
    Json(CleanupStatusResponse {
        busy: state.cleanup.is_busy(),
        last_run_at: last_run.map(|(at, _)| at),
        duplicates_found: last_run.map_or(0, |(_, s)| s.duplicates_found),
        duplicates_removed: last_run.map_or(0, |(_, s)| s.duplicates_removed),
        old_logs_removed: last_run.map_or(0, |(_, s)| s.old_logs_removed),
        orphaned_images_removed: last_run.map_or(0, |(_, s)| s.orphaned_images_removed),
        duration_ms: last_run.map_or(0, |(_, s)| u64::try_from(s.duration.as_millis()).unwrap_or(u64::MAX)),
    })
}

pub async fn config(State(state): State<Arc<AppState>>) -> Json<CleanupConfigResponse> {
    Json(CleanupConfigResponse {
        enabled: state.cleanup_config.enabled,
        cron: state.cleanup_config.cron.clone(),
        duplicate_threshold: state.cleanup_config.duplicate_threshold,
        max_age_days: state.cleanup_config.max_age_days,
        batch_size: state.cleanup_config.batch_size,
    })
}

pub async fn run(State(state): State<Arc<AppState>>) -> Result<Json<CleanupStatusResponse>, ApiError> {
    let stats = state
        .cleanup
        .try_run()
        .await
        .ok_or_else(|| ApiError::Conflict("a cleanup run is already in progress".to_owned()))?;
    Ok(Json(CleanupStatusResponse {
        busy: false,
        last_run_at: Some(chrono::Utc::now()),
        duplicates_found: stats.duplicates_found,
        duplicates_removed: stats.duplicates_removed,
        old_logs_removed: stats.old_logs_removed,
        orphaned_images_removed: stats.orphaned_images_removed,
        duration_ms: u64::try_from(stats.duration.as_millis()).unwrap_or(u64::MAX),
    }))
}

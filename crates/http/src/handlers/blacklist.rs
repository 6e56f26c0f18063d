//! Blacklist CRUD and probe endpoints: `/blacklist/...`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use logsink_storage::{BlacklistPatternPatch, IssueStore, NewBlacklistPattern};

use crate::api_error::ApiError;
use crate::query_types::{
    BlacklistListQuery, BlacklistTestBody, NewPatternBody, UpdatePatternBody,
};
use crate::response_types::{
    BlacklistPatternDto, BlacklistStatisticsResponse, BlacklistTestResponse,
};
use crate::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BlacklistListQuery>,
) -> Result<Json<Vec<BlacklistPatternDto>>, ApiError> {
    let patterns = state.store.list_patterns(query.application_id.as_deref()).await?;
    Ok(Json(patterns.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewPatternBody>,
) -> Result<(StatusCode, Json<BlacklistPatternDto>), ApiError> {
    let new_pattern = NewBlacklistPattern {
        pattern: body.pattern,
        pattern_type: body.pattern_type,
        application_id: body.application_id,
        reason: body.reason,
    };
    let created = state.store.create_pattern(new_pattern).await?;
    state.blacklist.refresh().await?;
    if state.blacklist_auto_delete {
        let closed = state.store.auto_delete_matching(&created).await?;
        if closed > 0 {
            tracing::info!(pattern_id = created.id, closed, "auto-delete closed matching issues");
        }
    }
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePatternBody>,
) -> Result<Json<BlacklistPatternDto>, ApiError> {
    let patch = BlacklistPatternPatch {
        pattern: body.pattern,
        pattern_type: body.pattern_type,
        application_id: body.application_id,
        reason: body.reason,
    };
    let updated = state.store.update_pattern(id, patch).await?;
    state.blacklist.refresh().await?;
    if state.blacklist_auto_delete {
        let closed = state.store.auto_delete_matching(&updated).await?;
        if closed > 0 {
            tracing::info!(pattern_id = updated.id, closed, "auto-delete closed matching issues");
        }
    }
    Ok(Json(updated.into()))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_pattern(id).await?;
    state.blacklist.refresh().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.store.delete_all_patterns().await?;
    state.blacklist.refresh().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BlacklistStatisticsResponse>, ApiError> {
    let stats = state.store.blacklist_statistics().await?;
    Ok(Json(stats.into()))
}

pub async fn test(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BlacklistTestBody>,
) -> Result<Json<BlacklistTestResponse>, ApiError> {
    let matched = state.blacklist.check(&body.message, &body.application_id).await?;
    Ok(Json(match matched {
        Some(m) => BlacklistTestResponse { is_blacklisted: true, pattern: Some(m.pattern), reason: m.reason },
        None => BlacklistTestResponse { is_blacklisted: false, pattern: None, reason: None },
    }))
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.blacklist.refresh().await?;
    Ok(StatusCode::NO_CONTENT)
}

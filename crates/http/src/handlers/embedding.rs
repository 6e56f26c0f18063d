//! Embedding Worker endpoints: `/embedding/...`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use logsink_core::IssueState;
use logsink_storage::IssueStore;

use crate::api_error::ApiError;
use crate::query_types::{EmbeddingSearchBody, SimilarQuery};
use crate::response_types::{EmbeddingStatusResponse, PendingCountResponse, SimilarIssueDto};
use crate::AppState;

pub async fn status(State(state): State<Arc<AppState>>) -> Json<EmbeddingStatusResponse> {
    Json(EmbeddingStatusResponse {
        busy: state.embedding_worker.is_busy(),
        enabled: state.embedding_worker_config.enabled,
        tick_secs: state.embedding_worker_config.tick_secs,
        batch_size: state.embedding_worker_config.batch_size,
        similarity_threshold: state.embedding_worker_config.similarity_threshold,
    })
}

pub async fn pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PendingCountResponse>, ApiError> {
    let applications = state.store.list_applications().await?;
    let mut by_application = BTreeMap::new();
    for app in applications {
        let count = state.lifecycle.list_by_state(&app, IssueState::Pending).await?.len();
        if count > 0 {
            by_application.insert(app, count);
        }
    }
    let pending = by_application.values().sum();
    Ok(Json(PendingCountResponse { pending, by_application }))
}

pub async fn process(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state
        .embedding_worker
        .try_tick()
        .await
        .ok_or_else(|| ApiError::Conflict("an embedding tick is already in progress".to_owned()))?;
    Ok(Json(serde_json::json!({
        "claimed": stats.claimed,
        "merged": stats.merged,
        "promoted": stats.promoted,
        "fallback": stats.fallback,
    })))
}

pub async fn process_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.embedding_worker.process_single(id).await?;
    Ok(Json(serde_json::json!({
        "claimed": stats.claimed,
        "merged": stats.merged,
        "promoted": stats.promoted,
        "fallback": stats.fallback,
    })))
}

pub async fn similar(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, uuid::Uuid)>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Vec<SimilarIssueDto>>, ApiError> {
    let issue = state.lifecycle.get(&app, id).await?;
    let embedding = issue
        .embedding
        .ok_or_else(|| ApiError::BadRequest("issue has no stored embedding".to_owned()))?;
    let neighbors = state
        .store
        .find_similar(&app, &embedding, query.limit, state.embedding_worker_config.similarity_threshold)
        .await?;
    Ok(Json(
        neighbors
            .into_iter()
            .filter(|n| n.issue_id != id)
            .map(|n| SimilarIssueDto { issue_id: n.issue_id, similarity: n.similarity, state: n.state })
            .collect(),
    ))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(app): Path<String>,
    Json(body): Json<EmbeddingSearchBody>,
) -> Result<Json<Vec<SimilarIssueDto>>, ApiError> {
    let client = state
        .embedding_client
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("embedding provider is not configured".to_owned()))?;
    let embedding = client
        .embed(&body.text)
        .await
        .map_err(|err| ApiError::Unavailable(err.to_string()))?;
    let neighbors = state
        .store
        .find_similar(&app, &embedding, body.limit, state.embedding_worker_config.similarity_threshold)
        .await?;
    Ok(Json(
        neighbors
            .into_iter()
            .map(|n| SimilarIssueDto { issue_id: n.issue_id, similarity: n.similarity, state: n.state })
            .collect(),
    ))
}

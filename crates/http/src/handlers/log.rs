//! Admission and lifecycle endpoints: `/log/...`.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use logsink_core::IssueState;
use logsink_service::{NewLogEntry, SetDoneRequest};
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::query_types::{
    AdmitRequestBody, ForceReopenBody, IssueFieldsBody, RevertBody, SetDoneBody, SetPlanBody,
};
use crate::response_types::{
    AdmitResponse, DeleteResponse, LogListResponse, StatisticsResponse, TransitionResponse,
};
use crate::AppState;

pub async fn admit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdmitRequestBody>,
) -> Result<Json<AdmitResponse>, ApiError> {
    let entry = NewLogEntry {
        application_id: body.application_id,
        message: body.message,
        timestamp: body.timestamp,
        context: body.context,
        issue_type: body.issue_type,
        effort: body.effort,
        plan: body.plan,
        llm_output: body.llm_output,
    };
    let outcome = state.admission.admit(entry).await?;
    Ok(Json(AdmitResponse::new(outcome.issue, outcome.action)))
}

pub async fn list_all(
    State(state): State<Arc<AppState>>,
    Path(app): Path<String>,
) -> Result<Json<LogListResponse>, ApiError> {
    let issues = state.lifecycle.list_all(&app).await?;
    Ok(Json(LogListResponse::new(app, issues)))
}

pub async fn list_by_state(
    State(state): State<Arc<AppState>>,
    Path((app, state_str)): Path<(String, String)>,
) -> Result<Json<LogListResponse>, ApiError> {
    let wanted = IssueState::from_str(&state_str)
        .map_err(|_| ApiError::BadRequest(format!("unknown state '{state_str}'")))?;
    let issues = state.lifecycle.list_by_state(&app, wanted).await?;
    Ok(Json(LogListResponse::new(app, issues)))
}

pub async fn start_progress(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, Uuid)>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let issue = state.lifecycle.start_progress(&app, id).await?;
    Ok(Json(TransitionResponse::new(issue)))
}

pub async fn set_done(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, Uuid)>,
    Json(body): Json<SetDoneBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let request = SetDoneRequest {
        message: body.message,
        error: body.error,
        git_commit: body.git_commit,
        statistics: body.statistics,
    };
    let issue = state.lifecycle.set_done(&app, id, request).await?;
    Ok(Json(TransitionResponse::new(issue)))
}

pub async fn revert(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, Uuid)>,
    Json(body): Json<RevertBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let issue = state.lifecycle.revert(&app, id, body.revert_reason).await?;
    Ok(Json(TransitionResponse::new(issue)))
}

pub async fn force_reopen(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, Uuid)>,
    Json(body): Json<ForceReopenBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let issue = state.lifecycle.force_reopen(&app, id, body.reject_reason).await?;
    Ok(Json(TransitionResponse::new(issue)))
}

pub async fn close(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, Uuid)>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let issue = state.lifecycle.close(&app, id).await?;
    Ok(Json(TransitionResponse::new(issue)))
}

pub async fn delete_all(
    State(state): State<Arc<AppState>>,
    Path(app): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let screenshots = state.lifecycle.delete_all(&app).await?;
    Ok(Json(DeleteResponse::new(screenshots)))
}

pub async fn delete_closed(
    State(state): State<Arc<AppState>>,
    Path(app): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let screenshots = state.lifecycle.delete_closed(&app).await?;
    Ok(Json(DeleteResponse::new(screenshots)))
}

pub async fn statistics(
    State(state): State<Arc<AppState>>,
    Path(app): Path<String>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let stats = state.lifecycle.statistics(&app).await?;
    Ok(Json(StatisticsResponse::new(app, stats)))
}

pub async fn set_plan(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, Uuid)>,
    Json(body): Json<SetPlanBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let issue = state.lifecycle.set_plan(&app, id, body.plan).await?;
    Ok(Json(TransitionResponse::new(issue)))
}

pub async fn set_issue_fields(
    State(state): State<Arc<AppState>>,
    Path((app, id)): Path<(String, Uuid)>,
    Json(body): Json<IssueFieldsBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let issue = state
        .lifecycle
        .set_issue_fields(&app, id, body.issue_type, body.effort, body.llm_output)
        .await?;
    Ok(Json(TransitionResponse::new(issue)))
}

/// Streams a persisted screenshot. `filename` must have been written by
/// this `app`'s Image Extractor (`<app>-img-...`), preventing cross-tenant
/// path guessing.
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((app, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let expected_prefix = format!("{app}-img-");
    if !filename.starts_with(&expected_prefix) || filename.contains('/') || filename.contains("..") {
        return Err(ApiError::NotFound("image not found".to_owned()));
    }
    let path = state.images_dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound("image not found".to_owned()))?;
    let content_type = image_content_type(&filename);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

fn image_content_type(filename: &str) -> &'static str {
    match filename.rsplit('.').next().unwrap_or("").to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

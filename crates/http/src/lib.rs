//! Axum HTTP surface over the admission pipeline, lifecycle engine,
//! blacklist cache, embedding worker and cleanup scheduler.
//!
//! This crate owns routing, request/response translation and
//! authentication; every domain decision is delegated to `logsink-service`,
//! `logsink-storage` and `logsink-blacklist`.

mod api_error;
mod handlers;
mod query_types;
mod response_types;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use logsink_blacklist::BlacklistCache;
use logsink_embeddings::EmbeddingClient;
use logsink_service::{
    AdmissionPipeline, CleanupConfig, CleanupScheduler, EmbeddingWorker, EmbeddingWorkerConfig,
    LifecycleEngine,
};
use logsink_storage::IssueStore;
use tower_http::cors::CorsLayer;

pub use api_error::ApiError;

/// Shared state handed to every handler via axum's `State` extractor.
pub struct AppState {
    pub store: Arc<dyn IssueStore>,
    pub admission: Arc<AdmissionPipeline>,
    pub lifecycle: Arc<LifecycleEngine>,
    pub blacklist: Arc<BlacklistCache>,
    pub blacklist_auto_delete: bool,
    pub embedding_worker: Arc<EmbeddingWorker>,
    pub embedding_worker_config: EmbeddingWorkerConfig,
    pub embedding_client: Option<Arc<EmbeddingClient>>,
    pub cleanup: Arc<CleanupScheduler>,
    pub cleanup_config: CleanupConfig,
    pub images_dir: PathBuf,
    pub api_key: String,
}

/// Checks `X-API-Key` (or `Authorization: Bearer ...`) against
/// `state.api_key`. Skipped entirely for `/health` and `/openapi.json`,
/// which are wired outside this layer.
async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| {
            request
                .headers()
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_owned)
        });

    match provided {
        Some(key) if key == state.api_key => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized),
    }
}

fn cors_layer() -> CorsLayer {
    let origin = logsink_core::env_parse_with_default("CORS_ORIGIN", "*".to_owned());
    let layer = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);
    if origin == "*" {
        layer.allow_origin(tower_http::cors::Any)
    } else {
        match HeaderValue::from_str(&origin) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                tracing::warn!(origin, "invalid CORS_ORIGIN, falling back to permissive");
                layer.allow_origin(tower_http::cors::Any)
            },
        }
    }
}

/// Builds the full router: every endpoint in the HTTP surface, an API-key
/// gate over everything but the two unauthenticated probes, and a
/// configurable CORS layer.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/log", post(handlers::log::admit))
        .route("/log/{app}", get(handlers::log::list_all).delete(handlers::log::delete_all))
        .route("/log/{app}/closed", delete(handlers::log::delete_closed))
        .route("/log/{app}/statistics", get(handlers::log::statistics))
        .route("/log/{app}/img/{filename}", get(handlers::log::get_image))
        .route("/log/{app}/{state}", get(handlers::log::list_by_state))
        .route("/log/{app}/{id}/in-progress", patch(handlers::log::start_progress))
        .route("/log/{app}/{id}/revert", patch(handlers::log::revert))
        .route("/log/{app}/{id}/plan", patch(handlers::log::set_plan))
        .route("/log/{app}/{id}/issue-fields", patch(handlers::log::set_issue_fields))
        .route(
            "/log/{app}/{id}",
            put(handlers::log::set_done).post(handlers::log::force_reopen).delete(handlers::log::close),
        )
        .route(
            "/blacklist",
            get(handlers::blacklist::list)
                .post(handlers::blacklist::create)
                .delete(handlers::blacklist::delete_all),
        )
        .route(
            "/blacklist/{id}",
            put(handlers::blacklist::update).delete(handlers::blacklist::delete),
        )
        .route("/blacklist/test", post(handlers::blacklist::test))
        .route("/blacklist/statistics", get(handlers::blacklist::statistics))
        .route("/blacklist/refresh", post(handlers::blacklist::refresh))
        .route("/cleanup/status", get(handlers::cleanup::status))
        .route("/cleanup/config", get(handlers::cleanup::config))
        .route("/cleanup/run", post(handlers::cleanup::run))
        .route("/embedding/status", get(handlers::embedding::status))
        .route("/embedding/pending", get(handlers::embedding::pending))
        .route("/embedding/process", post(handlers::embedding::process))
        .route("/embedding/process/{logId}", post(handlers::embedding::process_one))
        .route("/embedding/similar/{app}/{id}", get(handlers::embedding::similar))
        .route("/embedding/search/{app}", post(handlers::embedding::search))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(handlers::admin::health))
        .route("/openapi.json", get(handlers::admin::openapi))
        .merge(authenticated)
        .layer(cors_layer())
        .with_state(state)
}

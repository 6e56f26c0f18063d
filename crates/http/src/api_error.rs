//! Typed API error for HTTP handlers.
//!
//! Converts domain errors into proper HTTP responses with a JSON body and
//! status code, following the error taxonomy: handlers return
//! `Result<Json<T>, ApiError>` instead of losing error context to a bare
//! `StatusCode`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use logsink_blacklist::BlacklistError;
use logsink_service::ServiceError;
use logsink_storage::StorageError;
use serde_json::json;

/// API error with an HTTP status code and a human-readable message.
///
/// `Internal`/`Unavailable` log the real error server-side and return a
/// generic message to the client; no internal detail leaks across the
/// boundary.
#[derive(Debug)]
pub enum ApiError {
    /// 400 — missing/malformed field, or an illegal state transition.
    BadRequest(String),
    /// 401 — missing or invalid `X-API-Key`/bearer token.
    Unauthorized,
    /// 403 — rejected by a blacklist pattern.
    Blocked {
        /// The pattern that matched.
        pattern: String,
        /// The operator-supplied reason, if any.
        reason: Option<String>,
    },
    /// 404 — requested entity does not exist.
    NotFound(String),
    /// 409 — unique-key conflict, or a singleton background task already running.
    Conflict(String),
    /// 503 — a dependent feature (embedding/LLM) is disabled or unreachable.
    Unavailable(String),
    /// 500 — unexpected failure. Detail is logged, never returned to the caller.
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({"error": "missing or invalid API key"}))
            },
            Self::Blocked { pattern, reason } => (
                StatusCode::FORBIDDEN,
                json!({"error": "blocked by blacklist pattern", "pattern": pattern, "reason": reason}),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"error": msg})),
            Self::Conflict(msg) => (StatusCode::CONFLICT, json!({"error": msg})),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, json!({"error": msg})),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "internal server error"}))
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound("no matching issue or pattern".to_owned()),
            StorageError::PreconditionFailed { current, requested } => {
                Self::BadRequest(format!(
                    "cannot transition to '{requested}' from current state '{current}'"
                ))
            },
            StorageError::Conflict(msg) => Self::Conflict(msg),
            StorageError::Database(_) | StorageError::Migration(_) => Self::Internal(err.into()),
        }
    }
}

impl From<BlacklistError> for ApiError {
    fn from(err: BlacklistError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) => Self::BadRequest(msg),
            ServiceError::Blocked { pattern, reason } => Self::Blocked { pattern, reason },
            ServiceError::Storage(StorageError::NotFound) => {
                Self::NotFound("no matching issue or pattern".to_owned())
            },
            ServiceError::Storage(StorageError::PreconditionFailed { current, requested }) => {
                Self::BadRequest(format!(
                    "cannot transition to '{requested}' from current state '{current}'"
                ))
            },
            ServiceError::Storage(ref storage_err) if storage_err.is_duplicate() => {
                Self::Conflict(err.to_string())
            },
            ServiceError::Busy => Self::Conflict(err.to_string()),
            ServiceError::Blacklist(BlacklistError::Source(_)) | ServiceError::Storage(_) => {
                Self::Internal(err.into())
            },
            ServiceError::Image(_) => Self::Internal(err.into()),
            ServiceError::Embedding(_) | ServiceError::Unavailable(_) => {
                Self::Unavailable(err.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::NotFound("no such issue".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn blocked_maps_to_403() {
        let response =
            ApiError::Blocked { pattern: "panic:".to_owned(), reason: None }.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn storage_precondition_failed_maps_to_bad_request() {
        let err = StorageError::PreconditionFailed {
            current: "closed".to_owned(),
            requested: "open".to_owned(),
        };
        let response: Response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn service_busy_maps_to_conflict() {
        let response: Response = ApiError::from(ServiceError::Busy).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

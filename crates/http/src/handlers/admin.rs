//! Unauthenticated probe endpoints: `/health`, `/openapi.json`.

use axum::Json;
use serde_json::{json, Value};

use crate::response_types::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn openapi() -> Json<Value> {
    Json(json!({
        "openapi": "3.0.3",
        "info": { "title": "logsink", "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/log": { "post": { "summary": "Admit a log entry" } },
            "/log/{app}": { "get": { "summary": "List all issues for an application" } },
            "/log/{app}/{state}": { "get": { "summary": "List issues in a given state" } },
            "/log/{app}/{id}/in-progress": { "patch": { "summary": "Mark an issue in progress" } },
            "/log/{app}/{id}": {
                "put": { "summary": "Mark an issue done" },
                "post": { "summary": "Force-reopen a closed issue" },
                "delete": { "summary": "Delete a single issue" }
            },
            "/log/{app}/{id}/revert": { "patch": { "summary": "Revert an in-progress issue" } },
            "/log/{app}/{id}/plan": { "patch": { "summary": "Set an issue's plan" } },
            "/log/{app}/{id}/issue-fields": { "patch": { "summary": "Patch type/effort/llmOutput" } },
            "/log/{app}": { "delete": { "summary": "Delete all issues for an application" } },
            "/log/{app}/closed": { "delete": { "summary": "Delete closed issues for an application" } },
            "/log/{app}/statistics": { "get": { "summary": "Per-state issue counts" } },
            "/log/{app}/img/{filename}": { "get": { "summary": "Fetch a persisted screenshot" } },
            "/blacklist": {
                "get": { "summary": "List blacklist patterns" },
                "post": { "summary": "Create a blacklist pattern" },
                "delete": { "summary": "Delete all blacklist patterns" }
            },
            "/blacklist/{id}": {
                "put": { "summary": "Update a blacklist pattern" },
                "delete": { "summary": "Delete a blacklist pattern" }
            },
            "/blacklist/test": { "post": { "summary": "Test a message against the blacklist" } },
            "/blacklist/statistics": { "get": { "summary": "Blacklist pattern counters" } },
            "/blacklist/refresh": { "post": { "summary": "Force a blacklist cache refresh" } },
            "/cleanup/status": { "get": { "summary": "Cleanup scheduler status" } },
            "/cleanup/config": { "get": { "summary": "Cleanup scheduler configuration" } },
            "/cleanup/run": { "post": { "summary": "Trigger a cleanup run" } },
            "/embedding/status": { "get": { "summary": "Embedding worker status" } },
            "/embedding/pending": { "get": { "summary": "Pending-embedding count for an application" } },
            "/embedding/process": { "post": { "summary": "Trigger an embedding worker tick" } },
            "/embedding/process/{logId}": { "post": { "summary": "Process a single issue's embedding" } },
            "/embedding/similar/{app}/{id}": { "get": { "summary": "Nearest neighbors of a stored embedding" } },
            "/embedding/search/{app}": { "post": { "summary": "Search issues by embedded free text" } },
            "/health": { "get": { "summary": "Liveness probe" } },
        },
    }))
}

//! Lifecycle Engine: validated wrappers over the Store's transition
//! methods. Input validation and config-driven policy (e.g.
//! `LIFECYCLE_PLAN_PROMOTES`) live here; the state machine itself and its
//! guards live in `logsink-core`/`logsink-storage`.

use std::sync::Arc;

use logsink_core::{Effort, Issue, IssueState, IssueType};
use logsink_storage::{IssueFieldsPatch, IssueStore, SetDoneFields};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::config::LifecycleConfig;
use crate::error::ServiceError;

/// Fields accepted by the "set done" operation, mirroring the HTTP body.
#[derive(Debug, Clone, Default)]
pub struct SetDoneRequest {
    /// Optional final message rewrite.
    pub message: Option<String>,
    /// Free-form worker summary.
    pub error: Option<String>,
    /// Git commit SHA that resolved the issue.
    pub git_commit: Option<String>,
    /// Arbitrary worker-reported statistics.
    pub statistics: Option<Json>,
}

/// Orchestrates lifecycle transitions over the Store, translating
/// caller-supplied fields and applying the `LIFECYCLE_PLAN_PROMOTES`
/// policy on `set_plan`.
pub struct LifecycleEngine {
    store: Arc<dyn IssueStore>,
    config: LifecycleConfig,
}

impl LifecycleEngine {
    /// Creates an engine over `store`, governed by `config`.
    #[must_use]
    pub fn new(store: Arc<dyn IssueStore>, config: LifecycleConfig) -> Self {
        Self { store, config }
    }

    /// `open|revert -> in_progress`.
    pub async fn start_progress(&self, application_id: &str, id: Uuid) -> Result<Issue, ServiceError> {
        self.store.start_progress(application_id, id).await.map_err(Into::into)
    }

    /// `open|in_progress -> done`.
    pub async fn set_done(
        &self,
        application_id: &str,
        id: Uuid,
        request: SetDoneRequest,
    ) -> Result<Issue, ServiceError> {
        let fields = SetDoneFields {
            message: request.message,
            llm_message: request.error,
            git_commit: request.git_commit,
            statistics: request.statistics,
        };
        self.store.set_done(application_id, id, fields).await.map_err(Into::into)
    }

    /// `done -> revert`.
    pub async fn revert(
        &self,
        application_id: &str,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Issue, ServiceError> {
        self.store.revert(application_id, id, reason).await.map_err(Into::into)
    }

    /// Any state but `open` -> `open`, merging `reject_reason` into context.
    pub async fn force_reopen(
        &self,
        application_id: &str,
        id: Uuid,
        reject_reason: Option<String>,
    ) -> Result<Issue, ServiceError> {
        self.store.force_reopen(application_id, id, reject_reason).await.map_err(Into::into)
    }

    /// Any state but `closed` -> `closed`.
    pub async fn close(&self, application_id: &str, id: Uuid) -> Result<Issue, ServiceError> {
        self.store.close(application_id, id).await.map_err(Into::into)
    }

    /// Sets `plan`, promoting a `pending` issue to `open` when
    /// `LIFECYCLE_PLAN_PROMOTES=true` (alongside the embedding-promotes
    /// default).
    pub async fn set_plan(
        &self,
        application_id: &str,
        id: Uuid,
        plan: String,
    ) -> Result<Issue, ServiceError> {
        if plan.trim().is_empty() {
            return Err(ServiceError::InvalidInput("plan must not be empty".to_owned()));
        }
        self.store
            .set_plan(application_id, id, plan, self.config.plan_promotes)
            .await
            .map_err(Into::into)
    }

    /// Partial update to issue-management fields.
    pub async fn set_issue_fields(
        &self,
        application_id: &str,
        id: Uuid,
        issue_type: Option<IssueType>,
        effort: Option<Effort>,
        llm_output: Option<Json>,
    ) -> Result<Issue, ServiceError> {
        let patch = IssueFieldsPatch { issue_type, effort, llm_output };
        self.store.set_issue_fields(application_id, id, patch).await.map_err(Into::into)
    }

    /// All issues for an application.
    pub async fn list_all(&self, application_id: &str) -> Result<Vec<Issue>, ServiceError> {
        self.store.list_all(application_id).await.map_err(Into::into)
    }

    /// Issues in a single state; `open` returns the worker-facing
    /// `revert`-then-`open` view.
    pub async fn list_by_state(
        &self,
        application_id: &str,
        state: IssueState,
    ) -> Result<Vec<Issue>, ServiceError> {
        if state == IssueState::Open {
            return self.store.list_open_for_workers(application_id).await.map_err(Into::into);
        }
        self.store.list_by_state(application_id, state).await.map_err(Into::into)
    }

    /// A single issue.
    pub async fn get(&self, application_id: &str, id: Uuid) -> Result<Issue, ServiceError> {
        self.store.get(application_id, id).await.map_err(Into::into)
    }

    /// Per-state counts for an application.
    pub async fn statistics(
        &self,
        application_id: &str,
    ) -> Result<logsink_storage::IssueStatistics, ServiceError> {
        self.store.statistics(application_id).await.map_err(Into::into)
    }

    /// Deletes every issue for an application, returning deleted
    /// screenshots for the caller to GC.
    pub async fn delete_all(&self, application_id: &str) -> Result<Vec<String>, ServiceError> {
        self.store.delete_all(application_id).await.map_err(Into::into)
    }

    /// Deletes only `closed` issues for an application.
    pub async fn delete_closed(&self, application_id: &str) -> Result<Vec<String>, ServiceError> {
        self.store.delete_closed(application_id).await.map_err(Into::into)
    }
}

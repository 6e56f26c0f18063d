//! Admission Pipeline: validate → blacklist-check → extract images →
//! exact-duplicate probe → persist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use logsink_blacklist::BlacklistCache;
use logsink_core::{Effort, Issue, IssueState, IssueType};
use logsink_images::ImageExtractor;
use logsink_storage::{AdmitAction, IssueStore, NewIssueInput};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::config::LifecycleConfig;
use crate::error::ServiceError;

/// A validated, not-yet-admitted log entry.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    /// Scopes dedup, blacklist matching and similarity search.
    pub application_id: String,
    /// Required, non-empty.
    pub message: String,
    /// Caller-supplied admission instant; defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form JSON context; image fields are rewritten in place.
    pub context: Option<Json>,
    /// Issue-management classification.
    pub issue_type: Option<IssueType>,
    /// Issue-management classification.
    pub effort: Option<Effort>,
    /// Issue-management field.
    pub plan: Option<String>,
    /// Issue-management field, free-form worker output.
    pub llm_output: Option<Json>,
}

/// Successful outcome of [`AdmissionPipeline::admit`].
#[derive(Debug, Clone)]
pub struct AdmitOutcome {
    /// The persisted (or reopened) issue.
    pub issue: Issue,
    /// Whether a fresh issue was created or an existing `done` one reopened.
    pub action: AdmitAction,
}

/// Orchestrates blacklist checking, image extraction and create-or-reopen
/// persistence for a single incoming log entry.
pub struct AdmissionPipeline {
    store: Arc<dyn IssueStore>,
    blacklist: Arc<BlacklistCache>,
    images: Arc<ImageExtractor>,
    lifecycle: LifecycleConfig,
}

impl AdmissionPipeline {
    /// Creates a pipeline over the given Store, Blacklist Cache and Image
    /// Extractor.
    #[must_use]
    pub fn new(
        store: Arc<dyn IssueStore>,
        blacklist: Arc<BlacklistCache>,
        images: Arc<ImageExtractor>,
        lifecycle: LifecycleConfig,
    ) -> Self {
        Self { store, blacklist, images, lifecycle }
    }

    /// Admits `entry`, returning the persisted outcome, or a
    /// [`ServiceError::Blocked`] if a blacklist pattern matched. Nothing is
    /// persisted on the blocked path.
    pub async fn admit(&self, entry: NewLogEntry) -> Result<AdmitOutcome, ServiceError> {
        if entry.application_id.trim().is_empty() {
            return Err(ServiceError::InvalidInput("applicationId is required".to_owned()));
        }
        if entry.message.trim().is_empty() {
            return Err(ServiceError::InvalidInput("message is required".to_owned()));
        }

        if let Some(matched) = self.blacklist.check(&entry.message, &entry.application_id).await? {
            return Err(ServiceError::Blocked { pattern: matched.pattern, reason: matched.reason });
        }

        let issue_id = Uuid::new_v4();
        let mut context = entry.context.clone().unwrap_or(Json::Object(serde_json::Map::new()));
        let screenshots =
            self.images.extract(&entry.application_id, issue_id, &mut context).await;

        let initial_state =
            if self.lifecycle.embedding_enabled { IssueState::Pending } else { IssueState::Open };

        let mut candidate = Issue::builder(entry.application_id, entry.message)
            .id(issue_id)
            .maybe_timestamp(entry.timestamp)
            .context(context.clone())
            .screenshots(screenshots.clone())
            .state(initial_state)
            .maybe_plan(entry.plan)
            .maybe_issue_type(entry.issue_type)
            .maybe_effort(entry.effort)
            .build();
        if entry.llm_output.is_some() {
            candidate.llm_output = entry.llm_output;
        }

        let input = NewIssueInput {
            candidate,
            incoming_context: context,
            incoming_screenshots: screenshots,
        };

        let result = self.store.admit_or_reopen(input).await?;
        Ok(AdmitOutcome { issue: result.issue, action: result.action })
    }
}

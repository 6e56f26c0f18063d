//! Issue struct, builder, merge algebra and dedup helpers.

mod dedup;
mod kind;
mod merge;
mod state;

pub use dedup::{exact_duplicate_key, is_zero_vector, issue_embedding_text, SimilarIssue};
pub use kind::{Effort, IssueType};
pub use merge::{compute_absorb_merge, compute_reopen_merge, MergeWinner, ReopenMergeResult};
pub use state::IssueState;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

/// The primary entity. Identity is stable across every lifecycle
/// transition; only a merge (the source being absorbed into a
/// neighbor) removes an issue before it reaches `closed` and expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Issue {
    /// Opaque identifier, stable across all transitions.
    pub id: Uuid,
    /// Scopes dedup, blacklist matching and similarity search.
    pub application_id: String,
    /// Caller-supplied or server-assigned admission instant.
    pub timestamp: DateTime<Utc>,
    /// Primary natural key (together with `application_id`) for
    /// exact-duplicate detection.
    pub message: String,
    /// Free-form JSON context; image fields are rewritten to filenames
    /// by the Image Extractor during admission.
    pub context: Json,
    /// Ordered, append-only (on reopen/merge) filenames of persisted
    /// screenshots.
    pub screenshots: Vec<String>,
    /// Current lifecycle state.
    pub state: IssueState,
    /// Incremented on each reopen/merge-in; strictly monotone.
    pub reopen_count: u32,
    /// Issue-management field, set by a worker.
    pub plan: Option<String>,
    /// Issue-management field.
    pub issue_type: Option<IssueType>,
    /// Issue-management field.
    pub effort: Option<Effort>,
    /// Issue-management field, free-form worker output.
    pub llm_output: Option<Json>,
    /// Set on `done`.
    pub llm_message: Option<String>,
    /// Set on `done`.
    pub git_commit: Option<String>,
    /// Set on `done`.
    pub statistics: Option<Json>,
    /// Set on `revert`.
    pub revert_reason: Option<String>,
    /// Fixed-dimension embedding vector. Null while `pending`.
    pub embedding: Option<Vec<f32>>,
    /// Identifies the embedding model/provider that produced `embedding`.
    pub embedding_model: Option<String>,
    /// Set when a worker starts progress.
    pub started_at: Option<DateTime<Utc>>,
    /// Set on `done`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set on reopen (exact-duplicate admission against a `done` issue).
    pub reopened_at: Option<DateTime<Utc>>,
    /// Set on `revert`.
    pub reverted_at: Option<DateTime<Utc>>,
    /// First admission instant.
    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation; always `>= created_at`.
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Returns a new builder with the required fields set.
    #[must_use]
    pub fn builder(application_id: impl Into<String>, message: impl Into<String>) -> IssueBuilder {
        IssueBuilder::new(application_id.into(), message.into())
    }

    /// Reconstructs an issue from fully-known field values — every field
    /// already computed, as when a storage backend maps a database row.
    /// Bypasses the builder, which only fills in admission-time defaults;
    /// `#[non_exhaustive]` otherwise leaves other crates no way to
    /// construct one directly.
    #[must_use]
    #[expect(
        clippy::too_many_arguments,
        reason = "one parameter per persisted column, mirroring the row it reconstructs"
    )]
    pub fn hydrate(
        id: Uuid,
        application_id: String,
        timestamp: DateTime<Utc>,
        message: String,
        context: Json,
        screenshots: Vec<String>,
        state: IssueState,
        reopen_count: u32,
        plan: Option<String>,
        issue_type: Option<IssueType>,
        effort: Option<Effort>,
        llm_output: Option<Json>,
        llm_message: Option<String>,
        git_commit: Option<String>,
        statistics: Option<Json>,
        revert_reason: Option<String>,
        embedding: Option<Vec<f32>>,
        embedding_model: Option<String>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        reopened_at: Option<DateTime<Utc>>,
        reverted_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            application_id,
            timestamp,
            message,
            context,
            screenshots,
            state,
            reopen_count,
            plan,
            issue_type,
            effort,
            llm_output,
            llm_message,
            git_commit,
            statistics,
            revert_reason,
            embedding,
            embedding_model,
            started_at,
            completed_at,
            reopened_at,
            reverted_at,
            created_at,
            updated_at,
        }
    }
}

/// Builder for constructing [`Issue`] instances at admission time.
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    id: Uuid,
    application_id: String,
    timestamp: DateTime<Utc>,
    message: String,
    context: Json,
    screenshots: Vec<String>,
    state: IssueState,
    plan: Option<String>,
    issue_type: Option<IssueType>,
    effort: Option<Effort>,
}

impl IssueBuilder {
    #[must_use]
    fn new(application_id: String, message: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            application_id,
            timestamp: now,
            message,
            context: Json::Object(serde_json::Map::new()),
            screenshots: Vec::new(),
            state: IssueState::Open,
            plan: None,
            issue_type: None,
            effort: None,
        }
    }

    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn maybe_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        if let Some(timestamp) = timestamp {
            self.timestamp = timestamp;
        }
        self
    }

    #[must_use]
    pub fn context(mut self, context: Json) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn maybe_context(mut self, context: Option<Json>) -> Self {
        if let Some(context) = context {
            self.context = context;
        }
        self
    }

    #[must_use]
    pub fn screenshots(mut self, screenshots: Vec<String>) -> Self {
        self.screenshots = screenshots;
        self
    }

    /// Sets the initial state. Callers pick `pending` when the embedding
    /// feature is enabled, `open` otherwise (see the Lifecycle Engine's
    /// initial-state rule).
    #[must_use]
    pub fn state(mut self, state: IssueState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn maybe_plan(mut self, plan: Option<String>) -> Self {
        self.plan = plan;
        self
    }

    #[must_use]
    pub fn maybe_issue_type(mut self, issue_type: Option<IssueType>) -> Self {
        self.issue_type = issue_type;
        self
    }

    #[must_use]
    pub fn maybe_effort(mut self, effort: Option<Effort>) -> Self {
        self.effort = effort;
        self
    }

    #[must_use]
    pub fn build(self) -> Issue {
        let now = Utc::now();
        Issue {
            id: self.id,
            application_id: self.application_id,
            timestamp: self.timestamp,
            message: self.message,
            context: self.context,
            screenshots: self.screenshots,
            state: self.state,
            reopen_count: 0,
            plan: self.plan,
            issue_type: self.issue_type,
            effort: self.effort,
            llm_output: None,
            llm_message: None,
            git_commit: None,
            statistics: None,
            revert_reason: None,
            embedding: None,
            embedding_model: None,
            started_at: None,
            completed_at: None,
            reopened_at: None,
            reverted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_open_with_zero_reopen_count() {
        let issue = Issue::builder("app-1", "boom").build();
        assert_eq!(issue.state, IssueState::Open);
        assert_eq!(issue.reopen_count, 0);
        assert!(issue.embedding.is_none());
        assert_eq!(issue.updated_at, issue.created_at);
    }

    #[test]
    fn builder_honors_pending_state_for_embedding_mode() {
        let issue = Issue::builder("app-1", "boom").state(IssueState::Pending).build();
        assert_eq!(issue.state, IssueState::Pending);
    }
}

//! Maps `issues` rows onto [`Issue`].

use chrono::{DateTime, Utc};
use logsink_core::{Effort, Issue, IssueState, IssueType};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::StorageError;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct IssueRow {
    pub id: Uuid,
    pub application_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub context: Json,
    pub screenshots: Vec<String>,
    pub state: String,
    pub reopen_count: i32,
    pub plan: Option<String>,
    pub issue_type: Option<String>,
    pub effort: Option<String>,
    pub llm_output: Option<Json>,
    pub llm_message: Option<String>,
    pub git_commit: Option<String>,
    pub statistics: Option<Json>,
    pub revert_reason: Option<String>,
    pub embedding: Option<pgvector::Vector>,
    pub embedding_model: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reopened_at: Option<DateTime<Utc>>,
    pub reverted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<IssueRow> for Issue {
    type Error = StorageError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        let state: IssueState = row
            .state
            .parse()
            .map_err(|_| StorageError::Conflict(format!("corrupt state in row {}: {}", row.id, row.state)))?;
        let issue_type = row.issue_type.as_deref().map(str::parse::<IssueType>).transpose().unwrap_or_default();
        let effort = row.effort.as_deref().map(str::parse::<Effort>).transpose().unwrap_or_default();

        Ok(Issue::hydrate(
            row.id,
            row.application_id,
            row.timestamp,
            row.message,
            row.context,
            row.screenshots,
            state,
            row.reopen_count.max(0) as u32,
            row.plan,
            issue_type,
            effort,
            row.llm_output,
            row.llm_message,
            row.git_commit,
            row.statistics,
            row.revert_reason,
            row.embedding.map(pgvector::Vector::to_vec),
            row.embedding_model,
            row.started_at,
            row.completed_at,
            row.reopened_at,
            row.reverted_at,
            row.created_at,
            row.updated_at,
        ))
    }
}

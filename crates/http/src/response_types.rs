//! Response DTOs. Translates domain types (snake_case) to the camelCase
//! JSON wire format.

use logsink_core::{BlacklistPattern, Effort, Issue, IssueState, IssueType};
use logsink_storage::{AdmitAction, BlacklistStatistics, IssueStatistics};
use serde::Serialize;
use serde_json::Value as Json;

/// Wire representation of an [`Issue`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDto {
    pub id: uuid::Uuid,
    pub application_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub message: String,
    pub context: Json,
    pub screenshots: Vec<String>,
    pub state: IssueState,
    pub reopen_count: u32,
    pub plan: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
    pub effort: Option<Effort>,
    pub llm_output: Option<Json>,
    pub llm_message: Option<String>,
    pub git_commit: Option<String>,
    pub statistics: Option<Json>,
    pub revert_reason: Option<String>,
    pub embedding_model: Option<String>,
    pub has_embedding: bool,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub reopened_at: Option<chrono::DateTime<chrono::Utc>>,
    pub reverted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Issue> for IssueDto {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            application_id: issue.application_id,
            timestamp: issue.timestamp,
            message: issue.message,
            context: issue.context,
            screenshots: issue.screenshots,
            state: issue.state,
            reopen_count: issue.reopen_count,
            plan: issue.plan,
            issue_type: issue.issue_type,
            effort: issue.effort,
            llm_output: issue.llm_output,
            llm_message: issue.llm_message,
            git_commit: issue.git_commit,
            statistics: issue.statistics,
            revert_reason: issue.revert_reason,
            embedding_model: issue.embedding_model,
            has_embedding: issue.embedding.is_some(),
            started_at: issue.started_at,
            completed_at: issue.completed_at,
            reopened_at: issue.reopened_at,
            reverted_at: issue.reverted_at,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
        }
    }
}

/// `POST /log` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitResponse {
    pub success: bool,
    pub logged: IssueDto,
    pub deduplicated: bool,
    pub action: &'static str,
}

impl AdmitResponse {
    #[must_use]
    pub fn new(issue: Issue, action: AdmitAction) -> Self {
        let (deduplicated, action) = match action {
            AdmitAction::CreatedNew => (false, "created_new"),
            AdmitAction::ReopenedExisting => (true, "reopened_existing"),
        };
        Self { success: true, logged: issue.into(), deduplicated, action }
    }
}

/// `GET /log/:app` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListResponse {
    pub application_id: String,
    pub total_logs: usize,
    pub logs: Vec<IssueDto>,
}

impl LogListResponse {
    #[must_use]
    pub fn new(application_id: String, issues: Vec<Issue>) -> Self {
        let total_logs = issues.len();
        Self { application_id, total_logs, logs: issues.into_iter().map(Into::into).collect() }
    }
}

/// Generic `{success, state}` response for a lifecycle transition.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub state: &'static str,
    pub issue: IssueDto,
}

impl TransitionResponse {
    #[must_use]
    pub fn new(issue: Issue) -> Self {
        Self { success: true, state: issue.state.as_str(), issue: issue.into() }
    }
}

/// `DELETE /log/:app/:id` and purge responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_screenshots: usize,
}

impl DeleteResponse {
    #[must_use]
    pub fn new(screenshots: Vec<String>) -> Self {
        Self { success: true, deleted_screenshots: screenshots.len() }
    }
}

/// `GET /log/:app/statistics` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub application_id: String,
    pub total: i64,
    pub by_state: std::collections::BTreeMap<String, i64>,
}

impl StatisticsResponse {
    #[must_use]
    pub fn new(application_id: String, stats: IssueStatistics) -> Self {
        Self {
            application_id,
            total: stats.total,
            by_state: stats.by_state.into_iter().map(|(s, n)| (s.as_str().to_owned(), n)).collect(),
        }
    }
}

/// Wire representation of a [`BlacklistPattern`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistPatternDto {
    pub id: i64,
    pub pattern: String,
    pub pattern_type: logsink_core::PatternType,
    pub application_id: Option<String>,
    pub reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<BlacklistPattern> for BlacklistPatternDto {
    fn from(pattern: BlacklistPattern) -> Self {
        Self {
            id: pattern.id,
            pattern: pattern.pattern,
            pattern_type: pattern.pattern_type,
            application_id: pattern.application_id,
            reason: pattern.reason,
            created_at: pattern.created_at,
        }
    }
}

/// `POST /blacklist/test` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistTestResponse {
    pub is_blacklisted: bool,
    pub pattern: Option<String>,
    pub reason: Option<String>,
}

/// `GET /blacklist/statistics` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistStatisticsResponse {
    pub total_patterns: i64,
    pub global_patterns: i64,
    pub scoped_patterns: i64,
}

impl From<BlacklistStatistics> for BlacklistStatisticsResponse {
    fn from(stats: BlacklistStatistics) -> Self {
        Self {
            total_patterns: stats.total_patterns,
            global_patterns: stats.global_patterns,
            scoped_patterns: stats.scoped_patterns,
        }
    }
}

/// `GET /cleanup/status` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStatusResponse {
    pub busy: bool,
    pub last_run_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duplicates_found: u64,
    pub duplicates_removed: u64,
    pub old_logs_removed: u64,
    pub orphaned_images_removed: u64,
    pub duration_ms: u64,
}

/// `GET /cleanup/config` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupConfigResponse {
    pub enabled: bool,
    pub cron: String,
    pub duplicate_threshold: f64,
    pub max_age_days: i64,
    pub batch_size: i64,
}

/// `GET /embedding/status` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingStatusResponse {
    pub busy: bool,
    pub enabled: bool,
    pub tick_secs: u64,
    pub batch_size: i64,
    pub similarity_threshold: f32,
}

/// `GET /embedding/pending` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCountResponse {
    pub pending: usize,
    pub by_application: std::collections::BTreeMap<String, usize>,
}

/// One entry of `GET /embedding/similar/:app/:id` or `POST /embedding/search/:app`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarIssueDto {
    pub issue_id: uuid::Uuid,
    pub similarity: f32,
    pub state: IssueState,
}

/// `GET /health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

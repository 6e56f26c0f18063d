//! Abstract persistence contract over issues, blacklist patterns and
//! duplicate edges (§4.6). `logsink-postgres` is the only implementation
//! this workspace carries; the trait exists so the service layer depends
//! on a contract, not a driver.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logsink_core::{
    BlacklistPattern, Effort, Issue, IssueState, IssueType, PatternType, SimilarIssue,
};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::StorageError;

/// Which branch the admission pipeline's create-or-reopen step took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitAction {
    /// No matching `done` issue existed; a fresh row was inserted.
    CreatedNew,
    /// A matching `done` issue existed and was reopened in place.
    ReopenedExisting,
}

/// Result of [`IssueStore::admit_or_reopen`].
#[derive(Debug, Clone)]
pub struct AdmitResult {
    /// The persisted issue — freshly created, or the reopened existing one.
    pub issue: Issue,
    /// Which branch was taken.
    pub action: AdmitAction,
}

/// Everything the admission pipeline has computed by the time it is ready
/// to persist: a fully-built candidate issue (used verbatim on the
/// create branch) plus the raw incoming context/screenshots (used to
/// compute the merge on the reopen branch).
#[derive(Debug, Clone)]
pub struct NewIssueInput {
    /// The issue as it would be inserted if no `done` duplicate exists.
    pub candidate: Issue,
    /// The raw incoming context, pre-merge, for the reopen branch.
    pub incoming_context: Json,
    /// Filenames written by the Image Extractor for this admission.
    pub incoming_screenshots: Vec<String>,
}

/// Fields accepted by the `PUT /log/:app/:id` "set done" operation.
#[derive(Debug, Clone, Default)]
pub struct SetDoneFields {
    /// Optional final message rewrite.
    pub message: Option<String>,
    /// Free-form worker summary, stored as `llm_message`.
    pub llm_message: Option<String>,
    /// Git commit SHA that resolved the issue.
    pub git_commit: Option<String>,
    /// Arbitrary worker-reported statistics.
    pub statistics: Option<Json>,
}

/// Partial update accepted by `PATCH /log/:app/:id/issue-fields`.
#[derive(Debug, Clone, Default)]
pub struct IssueFieldsPatch {
    /// New `type` classification, if present.
    pub issue_type: Option<IssueType>,
    /// New `effort` classification, if present.
    pub effort: Option<Effort>,
    /// New `llm_output`, if present.
    pub llm_output: Option<Json>,
}

/// Per-state issue counts for `GET /log/:app/statistics`.
#[derive(Debug, Clone, Default)]
pub struct IssueStatistics {
    /// Total issues in the application, across every state.
    pub total: i64,
    /// Count per [`IssueState`].
    pub by_state: Vec<(IssueState, i64)>,
}

/// A new blacklist pattern, as submitted to `POST /blacklist`.
#[derive(Debug, Clone)]
pub struct NewBlacklistPattern {
    /// The literal or regex text to match.
    pub pattern: String,
    /// How `pattern` is interpreted.
    pub pattern_type: PatternType,
    /// `None` scopes the pattern globally.
    pub application_id: Option<String>,
    /// Operator-facing explanation.
    pub reason: Option<String>,
}

/// Partial update accepted by `PUT /blacklist/:id`.
#[derive(Debug, Clone, Default)]
pub struct BlacklistPatternPatch {
    /// New pattern text, if present.
    pub pattern: Option<String>,
    /// New pattern type, if present.
    pub pattern_type: Option<PatternType>,
    /// New scope; `Some(None)` clears it to global.
    pub application_id: Option<Option<String>>,
    /// New reason, if present.
    pub reason: Option<String>,
}

/// Aggregate counters for `GET /blacklist/statistics`.
#[derive(Debug, Clone, Default)]
pub struct BlacklistStatistics {
    /// Total number of patterns.
    pub total_patterns: i64,
    /// Number of global (`application_id IS NULL`) patterns.
    pub global_patterns: i64,
    /// Number of application-scoped patterns.
    pub scoped_patterns: i64,
}

/// The full persistence contract. Every method that mutates state is
/// implemented as a single atomic statement or transaction; no merge or
/// transition policy is decided by SQL — callers pass already-computed
/// values (see `logsink-core`'s merge algebra).
#[async_trait]
pub trait IssueStore: Send + Sync {
    // -- admission --------------------------------------------------

    /// Creates `input.candidate`, unless a `done` issue with the same
    /// `(application_id, message)` exists, in which case that issue is
    /// reopened (merged, `reopen_count` bumped, state set to `open`)
    /// instead. Implemented as a single transaction with a `SELECT ...
    /// FOR UPDATE` row lock on the matching `done` row, so two concurrent
    /// admissions of the same exact duplicate cannot both "win".
    async fn admit_or_reopen(&self, input: NewIssueInput) -> Result<AdmitResult, StorageError>;

    // -- reads --------------------------------------------------------

    /// Fetches a single issue, scoped to `application_id`.
    async fn get(&self, application_id: &str, id: Uuid) -> Result<Issue, StorageError>;

    /// Fetches a single issue by id alone, unscoped. Used by endpoints
    /// that only ever receive a log id (`POST /embedding/process/:logId`).
    async fn get_by_id(&self, id: Uuid) -> Result<Issue, StorageError>;

    /// All issues for an application, descending `timestamp`.
    async fn list_all(&self, application_id: &str) -> Result<Vec<Issue>, StorageError>;

    /// Issues in a single state, descending `timestamp`, ties broken by
    /// descending `updated_at` then descending `id`.
    async fn list_by_state(
        &self,
        application_id: &str,
        state: IssueState,
    ) -> Result<Vec<Issue>, StorageError>;

    /// The worker-facing "open" view: `revert` issues first, then `open`,
    /// each internally ordered as in [`Self::list_by_state`].
    async fn list_open_for_workers(&self, application_id: &str) -> Result<Vec<Issue>, StorageError>;

    /// Per-state counts for an application.
    async fn statistics(&self, application_id: &str) -> Result<IssueStatistics, StorageError>;

    // -- lifecycle transitions ----------------------------------------

    /// `open|revert -> in_progress`. Sets `started_at`.
    async fn start_progress(&self, application_id: &str, id: Uuid) -> Result<Issue, StorageError>;

    /// `open|in_progress -> done`. Sets `completed_at` and the supplied
    /// fields.
    async fn set_done(
        &self,
        application_id: &str,
        id: Uuid,
        fields: SetDoneFields,
    ) -> Result<Issue, StorageError>;

    /// `done -> revert`. Sets `reverted_at` and `revert_reason`.
    async fn revert(
        &self,
        application_id: &str,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Issue, StorageError>;

    /// Any state but `open` -> `open`, merging `reject_reason` into
    /// `context`. This is the forced-reopen operation, distinct from the
    /// exact-duplicate reopen performed by [`Self::admit_or_reopen`].
    async fn force_reopen(
        &self,
        application_id: &str,
        id: Uuid,
        reject_reason: Option<String>,
    ) -> Result<Issue, StorageError>;

    /// Any state but `closed` -> `closed`. Returns the issue as it stood
    /// immediately before the transition, so the caller can delete its
    /// owned screenshots from disk.
    async fn close(&self, application_id: &str, id: Uuid) -> Result<Issue, StorageError>;

    /// Sets `plan`. If `promote_pending` is true and the issue is
    /// currently `pending`, also promotes it to `open` in the same
    /// statement (the `LIFECYCLE_PLAN_PROMOTES` policy, §4.1).
    async fn set_plan(
        &self,
        application_id: &str,
        id: Uuid,
        plan: String,
        promote_pending: bool,
    ) -> Result<Issue, StorageError>;

    /// Partial update to issue-management fields.
    async fn set_issue_fields(
        &self,
        application_id: &str,
        id: Uuid,
        patch: IssueFieldsPatch,
    ) -> Result<Issue, StorageError>;

    // -- destructive operations ----------------------------------------

    /// Deletes every issue for an application. Returns the union of all
    /// deleted issues' screenshots, for the caller to GC from disk.
    async fn delete_all(&self, application_id: &str) -> Result<Vec<String>, StorageError>;

    /// Deletes only `closed` issues for an application. Returns deleted
    /// screenshots.
    async fn delete_closed(&self, application_id: &str) -> Result<Vec<String>, StorageError>;

    // -- embedding worker -----------------------------------------------

    /// Claims up to `limit` `pending` issues with `embedding IS NULL`,
    /// ordered by `created_at` ascending, excluding `exclude` (issues
    /// already claimed by this worker instance). Uses `SELECT ... FOR
    /// UPDATE SKIP LOCKED` so concurrent workers never double-claim.
    async fn claim_pending_batch(
        &self,
        limit: i64,
        exclude: &[Uuid],
    ) -> Result<Vec<Issue>, StorageError>;

    /// Persists `embedding`/`embedding_model` on a `pending` issue and
    /// transitions it to `open`.
    async fn save_embedding_and_promote(
        &self,
        id: Uuid,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<Issue, StorageError>;

    /// Moves a `pending` issue straight to `open` without an embedding,
    /// the fallback taken when the Embedding Client fails (§4.4 resolved
    /// note).
    async fn fallback_to_open(&self, id: Uuid) -> Result<Issue, StorageError>;

    /// Nearest neighbors of `embedding` within `application_id`, excluding
    /// `pending` issues and those without an embedding, ordered by
    /// ascending cosine distance, limited to `limit`, filtered to
    /// similarity >= `min_similarity`.
    async fn find_similar(
        &self,
        application_id: &str,
        embedding: &[f32],
        limit: i64,
        min_similarity: f32,
    ) -> Result<Vec<SimilarIssue>, StorageError>;

    /// Atomically absorbs `source_id` into `target_id`: applies the given
    /// merged context/screenshots/reopen_count to the target, inserts a
    /// DuplicateEdge `(target, source, score)` (on-conflict-ignore), and
    /// deletes the source row.
    async fn merge_issue(
        &self,
        target_id: Uuid,
        source_id: Uuid,
        merged_context: Json,
        merged_screenshots: Vec<String>,
        merged_reopen_count: i64,
        edge_score: f64,
    ) -> Result<(), StorageError>;

    // -- cleanup scheduler -----------------------------------------------

    /// Every distinct `application_id` with at least one issue.
    async fn list_applications(&self) -> Result<Vec<String>, StorageError>;

    /// Issues for `application_id` eligible for near-duplicate
    /// reconciliation: excludes `closed` and `pending`. Capped at
    /// `CLEANUP_DEDUP_MAX_ISSUES` issues, newest first (so the cap keeps
    /// the most recently active issues when an application exceeds it).
    async fn list_reconciliation_candidates(
        &self,
        application_id: &str,
        limit: i64,
    ) -> Result<Vec<Issue>, StorageError>;

    /// Deletes every `closed` issue older than `older_than`. Returns each
    /// deleted issue's id and screenshots for GC/logging.
    async fn expire_closed_older_than(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, Vec<String>)>, StorageError>;

    /// The set of every filename referenced by any live issue's
    /// `screenshots`, across every application. Used by the orphan-image
    /// sweep.
    async fn all_referenced_screenshots(&self) -> Result<HashSet<String>, StorageError>;

    // -- blacklist --------------------------------------------------------

    /// Every blacklist pattern, both global and application-scoped.
    async fn list_patterns(
        &self,
        application_id: Option<&str>,
    ) -> Result<Vec<BlacklistPattern>, StorageError>;

    /// Inserts a new pattern. Fails with `Conflict` on a duplicate
    /// `(pattern, application_id)` pair.
    async fn create_pattern(
        &self,
        new_pattern: NewBlacklistPattern,
    ) -> Result<BlacklistPattern, StorageError>;

    /// Partially updates an existing pattern.
    async fn update_pattern(
        &self,
        id: i64,
        patch: BlacklistPatternPatch,
    ) -> Result<BlacklistPattern, StorageError>;

    /// Deletes a single pattern by id.
    async fn delete_pattern(&self, id: i64) -> Result<(), StorageError>;

    /// Deletes every pattern.
    async fn delete_all_patterns(&self) -> Result<(), StorageError>;

    /// Aggregate pattern counts.
    async fn blacklist_statistics(&self) -> Result<BlacklistStatistics, StorageError>;

    /// Closes every open-ish issue in `pattern`'s scope whose `message`
    /// matches it (the auto-delete policy, §4.3). Application-scoped
    /// patterns only — global auto-delete is not implemented, to bound
    /// cost. Returns the number of issues closed.
    async fn auto_delete_matching(&self, pattern: &BlacklistPattern) -> Result<u64, StorageError>;
}

//! Issue CRUD, lifecycle transitions and listings.

use async_trait::async_trait;
use logsink_core::{exact_duplicate_key, compute_reopen_merge, Issue, IssueState};
use uuid::Uuid;

use super::PgStore;
use crate::error::StorageError;
use crate::row::IssueRow;
use crate::store::{
    AdmitAction, AdmitResult, IssueFieldsPatch, IssueStatistics, IssueStore, NewIssueInput,
    SetDoneFields,
};

impl PgStore {
    /// Resolves why a guarded UPDATE touched zero rows: either the issue
    /// does not exist (`NotFound`), or it exists but was not in an
    /// allowed state (`PreconditionFailed`, carrying both the state it was
    /// actually found in and the state the caller requested).
    async fn resolve_guard_failure(
        &self,
        application_id: &str,
        id: Uuid,
        requested: &str,
    ) -> StorageError {
        match self.get(application_id, id).await {
            Ok(issue) => StorageError::PreconditionFailed {
                current: issue.state.as_str().to_owned(),
                requested: requested.to_owned(),
            },
            Err(_) => StorageError::NotFound,
        }
    }
}

#[async_trait]
impl IssueStore for PgStore {
    async fn admit_or_reopen(&self, input: NewIssueInput) -> Result<AdmitResult, StorageError> {
        let candidate = input.candidate;
        let match_key = exact_duplicate_key(&candidate.message, &input.incoming_context);
        let mut tx = self.pool().begin().await?;

        let existing: Option<IssueRow> = sqlx::query_as(
            "SELECT * FROM issues \
             WHERE application_id = $1 AND state = 'done' \
               AND (message || COALESCE(context->>'message', '')) = $2 \
             FOR UPDATE LIMIT 1",
        )
        .bind(&candidate.application_id)
        .bind(&match_key)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing_row) = existing {
            let existing_issue: Issue = existing_row.try_into()?;
            let merge = compute_reopen_merge(&existing_issue, &input.incoming_context, &input.incoming_screenshots);
            let row: IssueRow = sqlx::query_as(
                "UPDATE issues SET \
                    context = $2, screenshots = $3, reopen_count = $4, \
                    state = 'open', timestamp = now(), reopened_at = now() \
                 WHERE id = $1 \
                 RETURNING *",
            )
            .bind(existing_issue.id)
            .bind(&merge.context)
            .bind(&merge.screenshots)
            .bind(merge.reopen_count as i32)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok(AdmitResult { issue: row.try_into()?, action: AdmitAction::ReopenedExisting });
        }

        let row: IssueRow = sqlx::query_as(
            "INSERT INTO issues ( \
                id, application_id, timestamp, message, context, screenshots, state, \
                reopen_count, plan, issue_type, effort, llm_output, llm_message, git_commit, \
                statistics, revert_reason, embedding, embedding_model, started_at, completed_at, \
                reopened_at, reverted_at, created_at, updated_at \
             ) VALUES ( \
                $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23,$24 \
             ) RETURNING *",
        )
        .bind(candidate.id)
        .bind(&candidate.application_id)
        .bind(candidate.timestamp)
        .bind(&candidate.message)
        .bind(&candidate.context)
        .bind(&candidate.screenshots)
        .bind(candidate.state.as_str())
        .bind(candidate.reopen_count as i32)
        .bind(&candidate.plan)
        .bind(candidate.issue_type.map(|t| t.as_str()))
        .bind(candidate.effort.map(|e| e.as_str()))
        .bind(&candidate.llm_output)
        .bind(&candidate.llm_message)
        .bind(&candidate.git_commit)
        .bind(&candidate.statistics)
        .bind(&candidate.revert_reason)
        .bind(candidate.embedding.clone().map(pgvector::Vector::from))
        .bind(&candidate.embedding_model)
        .bind(candidate.started_at)
        .bind(candidate.completed_at)
        .bind(candidate.reopened_at)
        .bind(candidate.reverted_at)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::from_insert)?;
        tx.commit().await?;
        Ok(AdmitResult { issue: row.try_into()?, action: AdmitAction::CreatedNew })
    }

    async fn get(&self, application_id: &str, id: Uuid) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> =
            sqlx::query_as("SELECT * FROM issues WHERE application_id = $1 AND id = $2")
                .bind(application_id)
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        row.ok_or(StorageError::NotFound)?.try_into()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.ok_or(StorageError::NotFound)?.try_into()
    }

    async fn list_all(&self, application_id: &str) -> Result<Vec<Issue>, StorageError> {
        let rows: Vec<IssueRow> = sqlx::query_as(
            "SELECT * FROM issues WHERE application_id = $1 \
             ORDER BY timestamp DESC, updated_at DESC, id ASC",
        )
        .bind(application_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_by_state(
        &self,
        application_id: &str,
        state: IssueState,
    ) -> Result<Vec<Issue>, StorageError> {
        let rows: Vec<IssueRow> = sqlx::query_as(
            "SELECT * FROM issues WHERE application_id = $1 AND state = $2 \
             ORDER BY timestamp DESC, updated_at DESC, id ASC",
        )
        .bind(application_id)
        .bind(state.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_open_for_workers(&self, application_id: &str) -> Result<Vec<Issue>, StorageError> {
        let rows: Vec<IssueRow> = sqlx::query_as(
            "SELECT * FROM issues WHERE application_id = $1 AND state IN ('open', 'revert') \
             ORDER BY (state = 'revert') DESC, timestamp DESC, updated_at DESC, id ASC",
        )
        .bind(application_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn statistics(&self, application_id: &str) -> Result<IssueStatistics, StorageError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT state, COUNT(*) FROM issues WHERE application_id = $1 GROUP BY state",
        )
        .bind(application_id)
        .fetch_all(self.pool())
        .await?;

        let mut total = 0i64;
        let mut by_state = Vec::with_capacity(rows.len());
        for (state, count) in rows {
            total += count;
            if let Ok(state) = state.parse::<IssueState>() {
                by_state.push((state, count));
            }
        }
        Ok(IssueStatistics { total, by_state })
    }

    async fn start_progress(&self, application_id: &str, id: Uuid) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET state = 'in_progress', started_at = now() \
             WHERE id = $1 AND application_id = $2 AND state = ANY($3) \
             RETURNING *",
        )
        .bind(id)
        .bind(application_id)
        .bind(IssueState::allowed_for(IssueState::can_start_progress))
        .fetch_optional(self.pool())
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(self.resolve_guard_failure(application_id, id, "in_progress").await),
        }
    }

    async fn set_done(
        &self,
        application_id: &str,
        id: Uuid,
        fields: SetDoneFields,
    ) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET \
                state = 'done', completed_at = now(), \
                message = COALESCE($3, message), \
                llm_message = COALESCE($4, llm_message), \
                git_commit = COALESCE($5, git_commit), \
                statistics = COALESCE($6, statistics) \
             WHERE id = $1 AND application_id = $2 AND state = ANY($7) \
             RETURNING *",
        )
        .bind(id)
        .bind(application_id)
        .bind(fields.message)
        .bind(fields.llm_message)
        .bind(fields.git_commit)
        .bind(fields.statistics)
        .bind(IssueState::allowed_for(IssueState::can_set_done))
        .fetch_optional(self.pool())
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(self.resolve_guard_failure(application_id, id, "done").await),
        }
    }

    async fn revert(
        &self,
        application_id: &str,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET state = 'revert', reverted_at = now(), revert_reason = $3 \
             WHERE id = $1 AND application_id = $2 AND state = ANY($4) \
             RETURNING *",
        )
        .bind(id)
        .bind(application_id)
        .bind(reason)
        .bind(IssueState::allowed_for(IssueState::can_revert))
        .fetch_optional(self.pool())
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(self.resolve_guard_failure(application_id, id, "revert").await),
        }
    }

    async fn force_reopen(
        &self,
        application_id: &str,
        id: Uuid,
        reject_reason: Option<String>,
    ) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET \
                state = 'open', \
                context = CASE WHEN $3::text IS NOT NULL \
                    THEN context || jsonb_build_object('reject_reason', $3::text) \
                    ELSE context END \
             WHERE id = $1 AND application_id = $2 AND state = ANY($4) \
             RETURNING *",
        )
        .bind(id)
        .bind(application_id)
        .bind(reject_reason)
        .bind(IssueState::allowed_for(IssueState::can_reopen))
        .fetch_optional(self.pool())
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(self.resolve_guard_failure(application_id, id, "open").await),
        }
    }

    async fn close(&self, application_id: &str, id: Uuid) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET state = 'closed' \
             WHERE id = $1 AND application_id = $2 AND state = ANY($3) \
             RETURNING *",
        )
        .bind(id)
        .bind(application_id)
        .bind(IssueState::allowed_for(IssueState::can_close))
        .fetch_optional(self.pool())
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(self.resolve_guard_failure(application_id, id, "closed").await),
        }
    }

    async fn set_plan(
        &self,
        application_id: &str,
        id: Uuid,
        plan: String,
        promote_pending: bool,
    ) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET \
                plan = $3, \
                state = CASE WHEN $4 AND state = 'pending' THEN 'open' ELSE state END \
             WHERE id = $1 AND application_id = $2 \
             RETURNING *",
        )
        .bind(id)
        .bind(application_id)
        .bind(plan)
        .bind(promote_pending)
        .fetch_optional(self.pool())
        .await?;
        row.ok_or(StorageError::NotFound)?.try_into()
    }

    async fn set_issue_fields(
        &self,
        application_id: &str,
        id: Uuid,
        patch: IssueFieldsPatch,
    ) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET \
                issue_type = COALESCE($3, issue_type), \
                effort = COALESCE($4, effort), \
                llm_output = COALESCE($5, llm_output) \
             WHERE id = $1 AND application_id = $2 \
             RETURNING *",
        )
        .bind(id)
        .bind(application_id)
        .bind(patch.issue_type.map(|t| t.as_str()))
        .bind(patch.effort.map(|e| e.as_str()))
        .bind(patch.llm_output)
        .fetch_optional(self.pool())
        .await?;
        row.ok_or(StorageError::NotFound)?.try_into()
    }

    async fn delete_all(&self, application_id: &str) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(Vec<String>,)> =
            sqlx::query_as("DELETE FROM issues WHERE application_id = $1 RETURNING screenshots")
                .bind(application_id)
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().flat_map(|(s,)| s).collect())
    }

    async fn delete_closed(&self, application_id: &str) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(Vec<String>,)> = sqlx::query_as(
            "DELETE FROM issues WHERE application_id = $1 AND state = 'closed' RETURNING screenshots",
        )
        .bind(application_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().flat_map(|(s,)| s).collect())
    }
}

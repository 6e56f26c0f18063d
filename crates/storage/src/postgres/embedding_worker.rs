//! Embedding Worker support: claiming pending issues, promotion, the
//! pgvector nearest-neighbor query and merge transaction.

use async_trait::async_trait;
use logsink_core::{Issue, SimilarIssue};
use serde_json::Value as Json;
use uuid::Uuid;

use super::PgStore;
use crate::error::StorageError;
use crate::row::IssueRow;
use crate::store::IssueStore;

#[async_trait]
impl IssueStore for PgStore {
    async fn claim_pending_batch(&self, limit: i64, exclude: &[Uuid]) -> Result<Vec<Issue>, StorageError> {
        let rows: Vec<IssueRow> = sqlx::query_as(
            "SELECT * FROM issues \
             WHERE state = 'pending' AND embedding IS NULL AND NOT (id = ANY($1)) \
             ORDER BY created_at ASC \
             LIMIT $2 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(exclude)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_embedding_and_promote(
        &self,
        id: Uuid,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET \
                embedding = $2, embedding_model = $3, state = 'open' \
             WHERE id = $1 AND state = 'pending' \
             RETURNING *",
        )
        .bind(id)
        .bind(pgvector::Vector::from(embedding))
        .bind(embedding_model)
        .fetch_optional(self.pool())
        .await?;
        row.ok_or(StorageError::NotFound)?.try_into()
    }

    async fn fallback_to_open(&self, id: Uuid) -> Result<Issue, StorageError> {
        let row: Option<IssueRow> = sqlx::query_as(
            "UPDATE issues SET state = 'open' WHERE id = $1 AND state = 'pending' RETURNING *",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.ok_or(StorageError::NotFound)?.try_into()
    }

    async fn find_similar(
        &self,
        application_id: &str,
        embedding: &[f32],
        limit: i64,
        min_similarity: f32,
    ) -> Result<Vec<SimilarIssue>, StorageError> {
        let probe = pgvector::Vector::from(embedding.to_vec());
        let rows: Vec<(Uuid, f64, String)> = sqlx::query_as(
            "SELECT id, 1.0 - (embedding <=> $2) AS similarity, state \
             FROM issues \
             WHERE application_id = $1 AND state <> 'pending' AND embedding IS NOT NULL \
               AND 1.0 - (embedding <=> $2) >= $3 \
             ORDER BY embedding <=> $2 ASC \
             LIMIT $4",
        )
        .bind(application_id)
        .bind(&probe)
        .bind(f64::from(min_similarity))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|(issue_id, similarity, state)| {
                let state = state
                    .parse()
                    .map_err(|_| StorageError::Conflict(format!("corrupt state on similarity row {issue_id}")))?;
                Ok(SimilarIssue { issue_id, similarity: similarity as f32, state })
            })
            .collect()
    }

    async fn merge_issue(
        &self,
        target_id: Uuid,
        source_id: Uuid,
        merged_context: Json,
        merged_screenshots: Vec<String>,
        merged_reopen_count: i64,
        edge_score: f64,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "UPDATE issues SET context = $2, screenshots = $3, reopen_count = $4 WHERE id = $1",
        )
        .bind(target_id)
        .bind(&merged_context)
        .bind(&merged_screenshots)
        .bind(merged_reopen_count as i32)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO duplicate_edges (original_log_id, duplicate_log_id, similarity_score) \
             VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(target_id)
        .bind(source_id)
        .bind(edge_score)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

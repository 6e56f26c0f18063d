//! Cleanup Scheduler support: application enumeration, reconciliation
//! candidates, closed-issue expiry and the orphan-image screenshot set.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logsink_core::Issue;
use uuid::Uuid;

use super::PgStore;
use crate::error::StorageError;
use crate::row::IssueRow;
use crate::store::IssueStore;

#[async_trait]
impl IssueStore for PgStore {
    async fn list_applications(&self) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT application_id FROM issues ORDER BY application_id ASC")
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|(app,)| app).collect())
    }

    async fn list_reconciliation_candidates(
        &self,
        application_id: &str,
        limit: i64,
    ) -> Result<Vec<Issue>, StorageError> {
        let rows: Vec<IssueRow> = sqlx::query_as(
            "SELECT * FROM issues \
             WHERE application_id = $1 AND state NOT IN ('closed', 'pending') \
             ORDER BY created_at DESC \
             LIMIT $2",
        )
        .bind(application_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn expire_closed_older_than(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, Vec<String>)>, StorageError> {
        let rows: Vec<(Uuid, Vec<String>)> = sqlx::query_as(
            "DELETE FROM issues WHERE state = 'closed' AND updated_at < $1 \
             RETURNING id, screenshots",
        )
        .bind(older_than)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn all_referenced_screenshots(&self) -> Result<HashSet<String>, StorageError> {
        let rows: Vec<(Vec<String>,)> = sqlx::query_as("SELECT screenshots FROM issues")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().flat_map(|(s,)| s).collect())
    }
}

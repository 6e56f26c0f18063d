//! Blacklist pattern CRUD and the auto-delete sweep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logsink_core::{BlacklistPattern, PatternType};

use super::PgStore;
use crate::error::StorageError;
use crate::store::{BlacklistPatternPatch, BlacklistStatistics, IssueStore, NewBlacklistPattern};

#[derive(sqlx::FromRow)]
struct PatternRow {
    id: i64,
    pattern: String,
    pattern_type: String,
    application_id: Option<String>,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PatternRow> for BlacklistPattern {
    type Error = StorageError;

    fn try_from(row: PatternRow) -> Result<Self, Self::Error> {
        let pattern_type: PatternType = row
            .pattern_type
            .parse()
            .map_err(|_| StorageError::Conflict(format!("corrupt pattern_type in row {}", row.id)))?;
        Ok(BlacklistPattern::hydrate(
            row.id,
            row.pattern,
            pattern_type,
            row.application_id,
            row.reason,
            row.created_at,
        ))
    }
}

#[async_trait]
impl IssueStore for PgStore {
    async fn list_patterns(
        &self,
        application_id: Option<&str>,
    ) -> Result<Vec<BlacklistPattern>, StorageError> {
        let rows: Vec<PatternRow> = match application_id {
            Some(app) => {
                sqlx::query_as(
                    "SELECT * FROM blacklist_patterns WHERE application_id IS NULL OR application_id = $1 \
                     ORDER BY id ASC",
                )
                .bind(app)
                .fetch_all(self.pool())
                .await?
            },
            None => {
                sqlx::query_as("SELECT * FROM blacklist_patterns ORDER BY id ASC")
                    .fetch_all(self.pool())
                    .await?
            },
        };
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_pattern(
        &self,
        new_pattern: NewBlacklistPattern,
    ) -> Result<BlacklistPattern, StorageError> {
        let row: PatternRow = sqlx::query_as(
            "INSERT INTO blacklist_patterns (pattern, pattern_type, application_id, reason) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(new_pattern.pattern)
        .bind(new_pattern.pattern_type.as_str())
        .bind(new_pattern.application_id)
        .bind(new_pattern.reason)
        .fetch_one(self.pool())
        .await
        .map_err(StorageError::from_insert)?;
        row.try_into()
    }

    async fn update_pattern(
        &self,
        id: i64,
        patch: BlacklistPatternPatch,
    ) -> Result<BlacklistPattern, StorageError> {
        let row: Option<PatternRow> = sqlx::query_as(
            "UPDATE blacklist_patterns SET \
                pattern = COALESCE($2, pattern), \
                pattern_type = COALESCE($3, pattern_type), \
                application_id = CASE WHEN $4 THEN $5 ELSE application_id END, \
                reason = COALESCE($6, reason) \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(patch.pattern)
        .bind(patch.pattern_type.map(|t| t.as_str()))
        .bind(patch.application_id.is_some())
        .bind(patch.application_id.flatten())
        .bind(patch.reason)
        .fetch_optional(self.pool())
        .await
        .map_err(StorageError::from_insert)?;
        row.ok_or(StorageError::NotFound)?.try_into()
    }

    async fn delete_pattern(&self, id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM blacklist_patterns WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_patterns(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM blacklist_patterns").execute(self.pool()).await?;
        Ok(())
    }

    async fn blacklist_statistics(&self) -> Result<BlacklistStatistics, StorageError> {
        let (total_patterns, global_patterns): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE application_id IS NULL) FROM blacklist_patterns",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(BlacklistStatistics {
            total_patterns,
            global_patterns,
            scoped_patterns: total_patterns - global_patterns,
        })
    }

    async fn auto_delete_matching(&self, pattern: &BlacklistPattern) -> Result<u64, StorageError> {
        let Some(application_id) = pattern.application_id.as_deref() else {
            return Ok(0);
        };
        let result = match pattern.pattern_type {
            PatternType::Exact => {
                sqlx::query(
                    "UPDATE issues SET state = 'closed' \
                     WHERE application_id = $1 AND state <> 'closed' AND message = $2",
                )
                .bind(application_id)
                .bind(&pattern.pattern)
                .execute(self.pool())
                .await?
            },
            PatternType::Substring => {
                sqlx::query(
                    "UPDATE issues SET state = 'closed' \
                     WHERE application_id = $1 AND state <> 'closed' AND message ILIKE $2",
                )
                .bind(application_id)
                .bind(format!("%{}%", pattern.pattern))
                .execute(self.pool())
                .await?
            },
            PatternType::Regex => {
                sqlx::query(
                    "UPDATE issues SET state = 'closed' \
                     WHERE application_id = $1 AND state <> 'closed' AND message ~* $2",
                )
                .bind(application_id)
                .bind(&pattern.pattern)
                .execute(self.pool())
                .await?
            },
        };
        Ok(result.rows_affected())
    }
}

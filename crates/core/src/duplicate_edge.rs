//! Duplicate-edge domain type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only history of a merge decision. Informational only: edges do
/// not affect queries against issues, and are cascade-deleted when either
/// endpoint issue is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct DuplicateEdge {
    /// Database-assigned identifier.
    pub id: i64,
    /// The issue that survived the merge.
    pub original_log_id: Uuid,
    /// The issue that was absorbed and deleted.
    pub duplicate_log_id: Uuid,
    /// Similarity score that triggered the merge, in `[0, 1]`.
    pub similarity_score: f64,
    /// When the merge was recorded.
    pub detected_at: DateTime<Utc>,
}

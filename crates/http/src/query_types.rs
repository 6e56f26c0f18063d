//! Query-string and request-body DTOs. JSON-facing names are camelCase;
//! domain types (`logsink_core`) stay snake_case, so every DTO here is a
//! deliberate translation layer, not a re-export.

use logsink_core::{Effort, IssueType, PatternType};
use serde::Deserialize;
use serde_json::Value as Json;

fn default_similar_limit() -> i64 {
    5
}

/// Distinguishes an absent field (container default, `None`) from a field
/// present with value `null` (`Some(None)`) for `Option<Option<T>>` members.
/// A plain derive can't tell the two apart: serde_json calls `visit_none`
/// for top-level `null` regardless of nesting, so the field must opt in to
/// this wrapper via `#[serde(default, deserialize_with = "double_option")]`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// `POST /log` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitRequestBody {
    pub application_id: String,
    pub message: String,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub context: Option<Json>,
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
    pub effort: Option<Effort>,
    pub plan: Option<String>,
    pub llm_output: Option<Json>,
}

/// `PUT /log/:app/:id` body.
#[derive(Debug, Deserialize, Default)]
pub struct SetDoneBody {
    pub message: Option<String>,
    pub error: Option<String>,
    pub git_commit: Option<String>,
    pub statistics: Option<Json>,
}

/// `PATCH /log/:app/:id/revert` body.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RevertBody {
    pub revert_reason: Option<String>,
}

/// `POST /log/:app/:id` (forced reopen) body.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ForceReopenBody {
    pub reject_reason: Option<String>,
}

/// `PATCH /log/:app/:id/plan` body.
#[derive(Debug, Deserialize)]
pub struct SetPlanBody {
    pub plan: String,
}

/// `PATCH /log/:app/:id/issue-fields` body.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueFieldsBody {
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
    pub effort: Option<Effort>,
    pub llm_output: Option<Json>,
}

/// `POST /blacklist` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatternBody {
    pub pattern: String,
    pub pattern_type: PatternType,
    pub application_id: Option<String>,
    pub reason: Option<String>,
}

/// `PUT /blacklist/:id` body. `application_id: Some(None)` clears the
/// pattern to global scope; omitted leaves it unchanged.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatternBody {
    pub pattern: Option<String>,
    pub pattern_type: Option<PatternType>,
    #[serde(default, deserialize_with = "double_option")]
    pub application_id: Option<Option<String>>,
    pub reason: Option<String>,
}

/// `POST /blacklist/test` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistTestBody {
    pub message: String,
    pub application_id: String,
}

/// `?applicationId=` filter on `GET /blacklist`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistListQuery {
    pub application_id: Option<String>,
}

/// `?limit=` on `GET /embedding/similar/:app/:id`.
#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    #[serde(default = "default_similar_limit")]
    pub limit: i64,
}

/// `POST /embedding/search/:app` body.
#[derive(Debug, Deserialize)]
pub struct EmbeddingSearchBody {
    pub text: String,
    #[serde(default = "default_similar_limit")]
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_request_body_accepts_camel_case_fields() {
        let body: AdmitRequestBody = serde_json::from_str(
            r#"{"applicationId": "app-1", "message": "boom", "type": "bugfix", "effort": "low"}"#,
        )
        .unwrap();
        assert_eq!(body.application_id, "app-1");
        assert_eq!(body.issue_type, Some(IssueType::Bugfix));
        assert_eq!(body.effort, Some(Effort::Low));
    }

    #[test]
    fn update_pattern_body_distinguishes_omitted_from_explicit_null() {
        let omitted: UpdatePatternBody = serde_json::from_str(r#"{"pattern": "x"}"#).unwrap();
        assert_eq!(omitted.application_id, None);

        let cleared: UpdatePatternBody =
            serde_json::from_str(r#"{"applicationId": null}"#).unwrap();
        assert_eq!(cleared.application_id, Some(None));
    }

    #[test]
    fn similar_query_defaults_limit() {
        let query: SimilarQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 5);
    }
}

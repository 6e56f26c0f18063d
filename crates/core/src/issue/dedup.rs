//! Semantic deduplication types and helpers for issues.

use std::collections::HashSet;

use serde_json::Value as Json;

use super::Issue;

/// A candidate neighbor surfaced by a vector-similarity query.
#[derive(Debug, Clone)]
pub struct SimilarIssue {
    /// ID of the existing similar issue.
    pub issue_id: uuid::Uuid,
    /// Cosine similarity score (0.0-1.0), `1 - cosine_distance`.
    pub similarity: f32,
    /// Lifecycle state of the neighbor, for merge-candidate filtering.
    pub state: super::IssueState,
}

/// Builds the text submitted to the Embedding Client for a `pending` issue.
///
/// Concatenates `"Message: <message>"`, `"Application: <application_id>"`
/// and a pretty-printed `context`, per the Embedding Worker's per-tick
/// contract.
#[must_use]
pub fn issue_embedding_text(issue: &Issue) -> String {
    let context = serde_json::to_string_pretty(&issue.context).unwrap_or_default();
    format!("Message: {}\nApplication: {}\n{context}", issue.message, issue.application_id)
}

/// Merges two string slices, removing duplicates while preserving order.
/// Items from `existing` appear first, then unique items from `newer`.
#[must_use]
pub fn union_dedup(existing: &[String], newer: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut result = Vec::with_capacity(existing.len().saturating_add(newer.len()));
    for item in existing.iter().chain(newer.iter()) {
        if seen.insert(item.as_str()) {
            result.push(item.clone());
        }
    }
    result
}

/// Computes the exact-duplicate match key for `(application_id, message)`
/// admission, per §4.2's rule that the natural key is `message` "optionally
/// concatenated with `context.message`" when the incoming context carries a
/// string `message` field. Storage backends apply the identical expression
/// to stored rows (`message || coalesce(context->>'message', '')`) so the
/// probe and the persisted rows are compared on the same key without an
/// extra column.
#[must_use]
pub fn exact_duplicate_key(message: &str, context: &Json) -> String {
    let suffix = context.get("message").and_then(|v| v.as_str()).unwrap_or("");
    format!("{message}{suffix}")
}

/// Returns `true` if every element in the vector is `0.0`.
/// A zero vector produces NaN in cosine distance, poisoning similarity
/// results, so callers treat it the same as "embedding unavailable".
#[must_use]
pub fn is_zero_vector(v: &[f32]) -> bool {
    v.iter().all(|f| *f == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_dedup_preserves_order_and_drops_duplicates() {
        let existing = vec!["a".to_owned(), "b".to_owned()];
        let newer = vec!["b".to_owned(), "c".to_owned()];
        assert_eq!(union_dedup(&existing, &newer), vec!["a", "b", "c"]);
    }

    #[test]
    fn exact_duplicate_key_appends_context_message_when_present() {
        let with_suffix = serde_json::json!({"message": "-detail"});
        assert_eq!(exact_duplicate_key("boom", &with_suffix), "boom-detail");
        assert_eq!(exact_duplicate_key("boom", &serde_json::json!({})), "boom");
    }

    #[test]
    fn zero_vector_is_detected() {
        assert!(is_zero_vector(&[0.0, 0.0, 0.0]));
        assert!(!is_zero_vector(&[0.0, 0.1, 0.0]));
    }

    #[test]
    fn embedding_text_includes_message_and_application() {
        let issue = Issue::builder("app-1", "NullPointerException").build();
        let text = issue_embedding_text(&issue);
        assert!(text.contains("Message: NullPointerException"));
        assert!(text.contains("Application: app-1"));
    }
}

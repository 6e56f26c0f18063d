//! Pure merge computation shared by the admission pipeline's reopen path,
//! the Embedding Worker's merge-into-other transition and the Cleanup
//! Scheduler's near-duplicate reconciliation phase.
//!
//! Keeping this in core (rather than duplicated in `logsink-service` and
//! `logsink-storage`) means the storage layer only has to apply the
//! computed values via `UPDATE`; no merge policy lives in SQL.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};

use super::dedup::union_dedup;
use super::Issue;

/// Result of absorbing one issue (the source) into another (the target).
/// Mirrors the embedding-merge and cleanup-reconciliation transitions,
/// which share identical field-level semantics (see §4.4.e / §4.5.1).
#[derive(Debug, Clone)]
pub struct ReopenMergeResult {
    /// Deep-merged context; on key conflict the incoming/source value wins.
    pub context: Json,
    /// Union of the existing and incoming screenshots, existing first.
    pub screenshots: Vec<String>,
    /// The target's `reopen_count`, incremented by one.
    pub reopen_count: u32,
}

/// Computes the result of reopening `existing` (a `done` issue, or a
/// merge target) with an incoming admission's context and screenshots.
/// Incoming values win on key conflicts, per the admission pipeline's
/// exact-duplicate-reopen step.
#[must_use]
pub fn compute_reopen_merge(
    existing: &Issue,
    incoming_context: &Json,
    incoming_screenshots: &[String],
) -> ReopenMergeResult {
    ReopenMergeResult {
        context: deep_merge_json(&existing.context, incoming_context),
        screenshots: union_dedup(&existing.screenshots, incoming_screenshots),
        reopen_count: existing.reopen_count.saturating_add(1),
    }
}

/// Which side's values win a scalar key conflict in [`compute_absorb_merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeWinner {
    /// The absorbed issue's values win. The Embedding Worker's
    /// merge-into-other transition uses this: the freshly-admitted
    /// duplicate's context is the more complete/current one.
    Source,
    /// The surviving issue's values win. The Cleanup Scheduler's
    /// near-duplicate reconciliation uses this: members are grouped by the
    /// newer one and "older-loses on key conflict".
    Target,
}

/// Computes the result of absorbing `source` into `target`, annotating the
/// target's context with merge provenance (`merged_from`, `merge_reason`,
/// `merge_timestamp`). Used by the Embedding Worker's merge-into-other
/// transition and the Cleanup Scheduler's near-duplicate reconciliation;
/// `winner` picks which side's values survive a scalar key conflict
/// (provenance fields always survive regardless, since only `source`'s
/// context can carry them).
#[must_use]
pub fn compute_absorb_merge(
    target: &Issue,
    source: &Issue,
    merge_reason: Option<&str>,
    now: DateTime<Utc>,
    winner: MergeWinner,
) -> ReopenMergeResult {
    let mut source_context = match &source.context {
        Json::Object(map) => map.clone(),
        _ => Map::new(),
    };
    source_context.insert("merged_from".to_owned(), Json::String(source.id.to_string()));
    if let Some(reason) = merge_reason {
        source_context.insert("merge_reason".to_owned(), Json::String(reason.to_owned()));
    }
    source_context.insert("merge_timestamp".to_owned(), Json::String(now.to_rfc3339()));
    let source_context = Json::Object(source_context);

    let context = match winner {
        MergeWinner::Source => deep_merge_json(&target.context, &source_context),
        MergeWinner::Target => deep_merge_json(&source_context, &target.context),
    };

    ReopenMergeResult {
        context,
        screenshots: union_dedup(&target.screenshots, &source.screenshots),
        reopen_count: target.reopen_count.saturating_add(1),
    }
}

/// Recursively merges `incoming` onto `base`. Nested objects are merged
/// key-by-key; any other conflicting value (including array vs scalar
/// mismatches) resolves in favor of `incoming`. Arrays are not
/// element-wise merged — an incoming array replaces the base array
/// wholesale, since `context` arrays have no stable identity to union on.
#[must_use]
pub fn deep_merge_json(base: &Json, incoming: &Json) -> Json {
    match (base, incoming) {
        (Json::Object(base_map), Json::Object(incoming_map)) => {
            let mut merged = base_map.clone();
            for (key, incoming_value) in incoming_map {
                let merged_value = match merged.get(key) {
                    Some(base_value) => deep_merge_json(base_value, incoming_value),
                    None => incoming_value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Json::Object(merged)
        },
        _ => incoming.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::issue::IssueState;

    fn make_issue(app: &str, message: &str) -> Issue {
        Issue::builder(app, message).state(IssueState::Done).build()
    }

    #[test]
    fn deep_merge_prefers_incoming_on_scalar_conflict() {
        let base = json!({"a": 1, "b": {"x": 1, "y": 2}});
        let incoming = json!({"a": 2, "b": {"x": 9}});
        let merged = deep_merge_json(&base, &incoming);
        assert_eq!(merged, json!({"a": 2, "b": {"x": 9, "y": 2}}));
    }

    #[test]
    fn reopen_merge_unions_screenshots_and_bumps_count() {
        let mut existing = make_issue("app", "boom");
        existing.screenshots = vec!["a.png".to_owned()];
        existing.reopen_count = 3;
        let incoming_context = json!({"trace": "..."});
        let result = compute_reopen_merge(&existing, &incoming_context, &["b.png".to_owned()]);
        assert_eq!(result.screenshots, vec!["a.png", "b.png"]);
        assert_eq!(result.reopen_count, 4);
        assert_eq!(result.context["trace"], "...");
    }

    #[test]
    fn absorb_merge_source_wins_on_conflict() {
        let mut target = make_issue("app", "boom");
        target.context = json!({"detail": "stale"});
        let mut source = make_issue("app", "boom variant");
        source.context = json!({"detail": "extra"});
        let now = Utc::now();
        let result =
            compute_absorb_merge(&target, &source, Some("near-duplicate"), now, MergeWinner::Source);
        assert_eq!(result.context["merged_from"], source.id.to_string());
        assert_eq!(result.context["merge_reason"], "near-duplicate");
        assert_eq!(result.context["detail"], "extra");
        assert_eq!(result.reopen_count, 1);
    }

    #[test]
    fn absorb_merge_target_wins_on_conflict_but_keeps_provenance() {
        let mut target = make_issue("app", "boom");
        target.context = json!({"detail": "fresh"});
        let mut source = make_issue("app", "boom variant");
        source.context = json!({"detail": "stale"});
        let now = Utc::now();
        let result =
            compute_absorb_merge(&target, &source, Some("near-duplicate"), now, MergeWinner::Target);
        assert_eq!(result.context["merged_from"], source.id.to_string());
        assert_eq!(result.context["detail"], "fresh");
        assert_eq!(result.reopen_count, 1);
    }
}

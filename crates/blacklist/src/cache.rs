//! The Blacklist Cache: an in-memory pattern index rebuilt from the Store
//! on TTL expiry or explicit mutation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use logsink_core::{BlacklistPattern, PatternType};
use regex::RegexBuilder;
use tokio::sync::{Mutex, RwLock};

use crate::error::BlacklistError;
use crate::source::BlacklistSource;

/// A pattern paired with its compiled matcher, if it is a regex.
struct CompiledPattern {
    pattern: BlacklistPattern,
    regex: Option<regex::Regex>,
}

impl CompiledPattern {
    fn compile(pattern: BlacklistPattern) -> Self {
        let regex = match pattern.pattern_type {
            PatternType::Regex => {
                match RegexBuilder::new(&pattern.pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(err) => {
                        tracing::warn!(
                            pattern = %pattern.pattern,
                            error = %err,
                            "ill-formed blacklist regex, pattern will never match"
                        );
                        None
                    },
                }
            },
            PatternType::Exact | PatternType::Substring => None,
        };
        Self { pattern, regex }
    }

    fn matches(&self, message: &str) -> bool {
        match self.pattern.pattern_type {
            PatternType::Exact => message == self.pattern.pattern,
            PatternType::Substring => {
                message.to_lowercase().contains(&self.pattern.pattern.to_lowercase())
            },
            PatternType::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(message)),
        }
    }
}

struct Snapshot {
    global: Vec<CompiledPattern>,
    by_app: std::collections::HashMap<String, Vec<CompiledPattern>>,
}

impl Snapshot {
    fn empty() -> Self {
        Self { global: Vec::new(), by_app: std::collections::HashMap::new() }
    }

    fn build(patterns: Vec<BlacklistPattern>) -> Self {
        let mut global = Vec::new();
        let mut by_app: std::collections::HashMap<String, Vec<CompiledPattern>> =
            std::collections::HashMap::new();
        for pattern in patterns {
            match pattern.application_id.clone() {
                None => global.push(CompiledPattern::compile(pattern)),
                Some(app) => by_app.entry(app).or_default().push(CompiledPattern::compile(pattern)),
            }
        }
        Self { global, by_app }
    }
}

/// The outcome of a blocked admission: which pattern matched and why.
#[derive(Debug, Clone)]
pub struct BlacklistMatch {
    /// The pattern that matched.
    pub pattern: String,
    /// The operator-supplied reason, if any.
    pub reason: Option<String>,
}

/// In-memory index of blacklist patterns, refreshed on startup, on TTL
/// expiry, and after any mutation (add/update/remove/clear). Readers take
/// a consistent snapshot; a refresh swaps an `Arc` so they never observe a
/// torn state.
pub struct BlacklistCache {
    source: Arc<dyn BlacklistSource>,
    snapshot: RwLock<Arc<Snapshot>>,
    last_refresh: Mutex<Option<Instant>>,
    ttl: Duration,
}

impl BlacklistCache {
    /// Creates a cache with an empty snapshot; the first call to
    /// [`Self::check`] or [`Self::refresh`] populates it lazily.
    #[must_use]
    pub fn new(source: Arc<dyn BlacklistSource>, ttl: Duration) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            last_refresh: Mutex::new(None),
            ttl,
        }
    }

    /// Unconditionally rebuilds the snapshot from the Store. Called on
    /// startup and after every blacklist mutation.
    pub async fn refresh(&self) -> Result<(), BlacklistError> {
        let patterns = self.source.list_patterns().await?;
        let snapshot = Arc::new(Snapshot::build(patterns));
        *self.snapshot.write().await = snapshot;
        *self.last_refresh.lock().await = Some(Instant::now());
        Ok(())
    }

    async fn ensure_fresh(&self) -> Result<(), BlacklistError> {
        let needs_refresh = match *self.last_refresh.lock().await {
            Some(when) => when.elapsed() >= self.ttl,
            None => true,
        };
        if needs_refresh {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Checks `message` against the cache for `application_id`, refreshing
    /// first if the TTL has elapsed. Global patterns are scanned before
    /// application-scoped ones; the first match wins.
    pub async fn check(
        &self,
        message: &str,
        application_id: &str,
    ) -> Result<Option<BlacklistMatch>, BlacklistError> {
        self.ensure_fresh().await?;
        let snapshot = self.snapshot.read().await.clone();

        for candidate in &snapshot.global {
            if candidate.matches(message) {
                return Ok(Some(BlacklistMatch {
                    pattern: candidate.pattern.pattern.clone(),
                    reason: candidate.pattern.reason.clone(),
                }));
            }
        }
        if let Some(app_patterns) = snapshot.by_app.get(application_id) {
            for candidate in app_patterns {
                if candidate.matches(message) {
                    return Ok(Some(BlacklistMatch {
                        pattern: candidate.pattern.pattern.clone(),
                        reason: candidate.pattern.reason.clone(),
                    }));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    struct FixtureSource {
        patterns: Vec<BlacklistPattern>,
    }

    #[async_trait::async_trait]
    impl BlacklistSource for FixtureSource {
        async fn list_patterns(&self) -> Result<Vec<BlacklistPattern>, BlacklistError> {
            Ok(self.patterns.clone())
        }
    }

    fn pattern(id: i64, text: &str, kind: PatternType, app: Option<&str>) -> BlacklistPattern {
        BlacklistPattern {
            id,
            pattern: text.to_owned(),
            pattern_type: kind,
            application_id: app.map(str::to_owned),
            reason: Some("test".to_owned()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn global_substring_match_blocks_any_application() {
        let source =
            Arc::new(FixtureSource { patterns: vec![pattern(1, "spam", PatternType::Substring, None)] });
        let cache = BlacklistCache::new(source, Duration::from_secs(300));
        let result = cache.check("This is spam", "app-1").await.unwrap();
        assert_eq!(result.unwrap().pattern, "spam");
    }

    #[tokio::test]
    async fn app_scoped_pattern_does_not_block_other_apps() {
        let source = Arc::new(FixtureSource {
            patterns: vec![pattern(1, "spam", PatternType::Substring, Some("app-1"))],
        });
        let cache = BlacklistCache::new(source, Duration::from_secs(300));
        assert!(cache.check("spam message", "app-2").await.unwrap().is_none());
        assert!(cache.check("spam message", "app-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn exact_pattern_requires_full_equality() {
        let source =
            Arc::new(FixtureSource { patterns: vec![pattern(1, "boom", PatternType::Exact, None)] });
        let cache = BlacklistCache::new(source, Duration::from_secs(300));
        assert!(cache.check("boom", "app").await.unwrap().is_some());
        assert!(cache.check("boom!", "app").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ill_formed_regex_never_matches() {
        let source = Arc::new(FixtureSource {
            patterns: vec![pattern(1, "(unclosed", PatternType::Regex, None)],
        });
        let cache = BlacklistCache::new(source, Duration::from_secs(300));
        assert!(cache.check("(unclosed", "app").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn regex_pattern_is_case_insensitive() {
        let source = Arc::new(FixtureSource {
            patterns: vec![pattern(1, "^fatal:", PatternType::Regex, None)],
        });
        let cache = BlacklistCache::new(source, Duration::from_secs(300));
        assert!(cache.check("FATAL: out of memory", "app").await.unwrap().is_some());
    }
}

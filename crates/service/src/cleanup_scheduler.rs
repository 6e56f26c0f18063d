//! Cleanup Scheduler: near-duplicate reconciliation, closed-issue expiry
//! and the orphan-image sweep.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use croner::Cron;
use logsink_core::{compute_absorb_merge, MergeWinner, CLEANUP_DEDUP_MAX_ISSUES};
use logsink_images::sweep_orphans;
use logsink_llm::LlmClient;
use logsink_storage::IssueStore;
use tokio::sync::{mpsc, Mutex};

use crate::config::CleanupConfig;

/// Aggregate counters published via `GET /cleanup/status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupRunStats {
    /// Near-duplicate pairs found at-or-above the duplicate threshold.
    pub duplicates_found: u64,
    /// Issues deleted after being merged as a near-duplicate.
    pub duplicates_removed: u64,
    /// Closed issues deleted by the age-based expiry phase.
    pub old_logs_removed: u64,
    /// Orphaned image files deleted by the sweep phase.
    pub orphaned_images_removed: u64,
    /// Wall-clock duration of the run.
    pub duration: std::time::Duration,
}

/// Periodic job reconciling near-duplicates, expiring old `closed` issues
/// and sweeping orphaned images. At most one run is active; a concurrent
/// trigger is a no-op (the `busy` signal).
pub struct CleanupScheduler {
    store: Arc<dyn IssueStore>,
    images_dir: PathBuf,
    llm: Option<LlmClient>,
    config: CleanupConfig,
    busy: AtomicBool,
    last_run: Mutex<Option<(DateTime<Utc>, CleanupRunStats)>>,
}

impl CleanupScheduler {
    /// Creates a scheduler over `store`, sweeping `images_dir` and
    /// optionally consulting `llm` for refined similarity.
    #[must_use]
    pub fn new(
        store: Arc<dyn IssueStore>,
        images_dir: PathBuf,
        llm: Option<LlmClient>,
        config: CleanupConfig,
    ) -> Self {
        Self { store, images_dir, llm, config, busy: AtomicBool::new(false), last_run: Mutex::new(None) }
    }

    /// Whether a run is currently in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// The most recently completed run's timestamp and counters, if any.
    pub async fn last_run(&self) -> Option<(DateTime<Utc>, CleanupRunStats)> {
        *self.last_run.lock().await.as_ref()?;
        self.last_run.lock().await.clone()
    }

    /// Runs one full pass if none is in progress; returns `None` (the
    /// `busy` signal) if a run is already active.
    pub async fn try_run(&self) -> Option<CleanupRunStats> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        let started = Instant::now();
        let stats = self.run_once().await;
        let stats = CleanupRunStats { duration: started.elapsed(), ..stats };
        *self.last_run.lock().await = Some((Utc::now(), stats));
        self.busy.store(false, Ordering::SeqCst);
        Some(stats)
    }

    async fn run_once(&self) -> CleanupRunStats {
        let mut stats = CleanupRunStats::default();

        self.reconcile_near_duplicates(&mut stats).await;
        self.expire_old_closed(&mut stats).await;
        self.sweep_orphan_images(&mut stats).await;

        stats
    }

    /// Phase 1: per-application pairwise near-duplicate reconciliation.
    async fn reconcile_near_duplicates(&self, stats: &mut CleanupRunStats) {
        let applications = match self.store.list_applications().await {
            Ok(apps) => apps,
            Err(err) => {
                tracing::error!(error = %err, "failed to list applications for cleanup");
                return;
            },
        };

        for application_id in applications {
            let limit = self.config.batch_size.min(CLEANUP_DEDUP_MAX_ISSUES as i64);
            let candidates =
                match self.store.list_reconciliation_candidates(&application_id, limit).await {
                    Ok(candidates) => candidates,
                    Err(err) => {
                        tracing::error!(
                            application_id, error = %err,
                            "failed to list reconciliation candidates"
                        );
                        continue;
                    },
                };

            // Newer-first; each surviving (not-yet-merged) issue is
            // compared against every older one so ties group onto the
            // newer member, per §4.5's "grouped by the newer member" rule.
            let mut merged_away = std::collections::HashSet::new();
            for newer_idx in 0..candidates.len() {
                let newer = &candidates[newer_idx];
                if merged_away.contains(&newer.id) {
                    continue;
                }
                for older in candidates.iter().skip(newer_idx + 1) {
                    if merged_away.contains(&older.id) {
                        continue;
                    }
                    let score = self.similarity(&newer.message, &older.message).await;
                    if score >= self.config.duplicate_threshold {
                        stats.duplicates_found += 1;
                        let merge = compute_absorb_merge(
                            newer,
                            older,
                            Some("near-duplicate"),
                            Utc::now(),
                            MergeWinner::Target,
                        );
                        match self
                            .store
                            .merge_issue(
                                newer.id,
                                older.id,
                                merge.context,
                                merge.screenshots,
                                i64::from(merge.reopen_count),
                                score,
                            )
                            .await
                        {
                            Ok(()) => {
                                merged_away.insert(older.id);
                                stats.duplicates_removed += 1;
                            },
                            Err(err) => tracing::warn!(
                                newer_id = %newer.id, older_id = %older.id, error = %err,
                                "near-duplicate merge failed"
                            ),
                        }
                    }
                }
            }
        }
    }

    /// Levenshtein-based similarity, refined by the LLM when configured
    /// and the Levenshtein score falls below the duplicate threshold.
    async fn similarity(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let base = strsim::normalized_levenshtein(a, b);
        if base >= self.config.duplicate_threshold {
            return base;
        }
        let Some(llm) = &self.llm else {
            return base;
        };
        match llm.refine_similarity(a, b).await {
            Ok(refined) => refined,
            Err(err) => {
                tracing::warn!(error = %err, "LLM refined-similarity call failed, using Levenshtein score");
                base
            },
        }
    }

    /// Phase 2: age-based expiry of `closed` issues.
    async fn expire_old_closed(&self, stats: &mut CleanupRunStats) {
        let cutoff = Utc::now() - chrono::Duration::days(self.config.max_age_days);
        match self.store.expire_closed_older_than(cutoff).await {
            Ok(expired) => stats.old_logs_removed = expired.len() as u64,
            Err(err) => tracing::error!(error = %err, "failed to expire old closed issues"),
        }
    }

    /// Phase 3: orphan-image sweep. Scans the Store before the filesystem
    /// so an in-flight admission's just-written file is never mistaken
    /// for an orphan.
    async fn sweep_orphan_images(&self, stats: &mut CleanupRunStats) {
        let referenced = match self.store.all_referenced_screenshots().await {
            Ok(set) => set,
            Err(err) => {
                tracing::error!(error = %err, "failed to list referenced screenshots");
                return;
            },
        };
        match sweep_orphans(&self.images_dir, &referenced).await {
            Ok(removed) => stats.orphaned_images_removed = removed.len() as u64,
            Err(err) => tracing::error!(error = %err, "orphan image sweep failed"),
        }
    }
}

/// Runs the scheduler on its cron schedule until `shutdown` fires, also
/// honoring explicit triggers sent over `trigger_rx` (`POST /cleanup/run`).
pub async fn run_cleanup_scheduler_loop(
    scheduler: Arc<CleanupScheduler>,
    cron_expr: String,
    mut trigger_rx: mpsc::Receiver<()>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let cron = match Cron::new(&cron_expr).parse() {
        Ok(cron) => cron,
        Err(err) => {
            tracing::error!(cron = %cron_expr, error = %err, "invalid cleanup cron expression, scheduler will only respond to explicit triggers");
            loop {
                tokio::select! {
                    Some(()) = trigger_rx.recv() => { log_run(scheduler.try_run().await); },
                    _ = shutdown.changed() => { if *shutdown.borrow() { break; } },
                }
            }
            return;
        },
    };

    loop {
        let now = Utc::now();
        let sleep_for = match cron.find_next_occurrence(&now, false) {
            Ok(next) => (next - now).to_std().unwrap_or(std::time::Duration::from_secs(60)),
            Err(err) => {
                tracing::error!(error = %err, "failed to compute next cleanup run time");
                std::time::Duration::from_secs(3600)
            },
        };

        tokio::select! {
            () = tokio::time::sleep(sleep_for) => { log_run(scheduler.try_run().await); },
            Some(()) = trigger_rx.recv() => { log_run(scheduler.try_run().await); },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("cleanup scheduler shutting down");
                    break;
                }
            },
        }
    }
}

fn log_run(stats: Option<CleanupRunStats>) {
    match stats {
        Some(stats) => tracing::info!(
            duplicates_found = stats.duplicates_found,
            duplicates_removed = stats.duplicates_removed,
            old_logs_removed = stats.old_logs_removed,
            orphaned_images_removed = stats.orphaned_images_removed,
            duration_ms = stats.duration.as_millis() as u64,
            "cleanup run complete"
        ),
        None => tracing::debug!("cleanup run skipped: already running"),
    }
}

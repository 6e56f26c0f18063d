//! Embedding Worker: drains `pending` issues, computing embeddings and
//! merging near-duplicates or promoting to `open`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use logsink_core::{
    compute_absorb_merge, issue_embedding_text, is_zero_vector, Issue, IssueState, MergeWinner,
    EMBEDDING_MERGE_EDGE_SCORE, NEIGHBOR_QUERY_LIMIT,
};
use logsink_embeddings::EmbeddingClient;
use logsink_storage::IssueStore;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::config::EmbeddingWorkerConfig;

/// Per-tick outcome counters, useful for `GET /embedding/status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddingTickStats {
    /// Issues claimed this tick.
    pub claimed: u64,
    /// Issues merged into an existing neighbor.
    pub merged: u64,
    /// Issues promoted to `open` with a persisted embedding.
    pub promoted: u64,
    /// Issues that fell back to `open` after an embedding-provider failure.
    pub fallback: u64,
}

/// Background task pool draining `pending` issues. At most one tick runs
/// at a time; a second trigger while running is a no-op (`try_tick`
/// returns `None`).
pub struct EmbeddingWorker {
    store: Arc<dyn IssueStore>,
    client: EmbeddingClient,
    model: String,
    config: EmbeddingWorkerConfig,
    busy: AtomicBool,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl EmbeddingWorker {
    /// Creates a worker over `store`, calling `client` for embeddings and
    /// recording `model` as the `embedding_model` on promotion.
    #[must_use]
    pub fn new(
        store: Arc<dyn IssueStore>,
        client: EmbeddingClient,
        model: String,
        config: EmbeddingWorkerConfig,
    ) -> Self {
        Self { store, client, model, config, busy: AtomicBool::new(false), in_flight: Mutex::new(HashSet::new()) }
    }

    /// Whether a tick is currently running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Runs one tick if none is in progress; returns `None` (the `busy`
    /// signal) if a tick is already running.
    pub async fn try_tick(&self) -> Option<EmbeddingTickStats> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        let stats = self.tick().await;
        self.busy.store(false, Ordering::SeqCst);
        Some(stats)
    }

    /// Processes a single issue on demand (`POST /embedding/process/:logId`),
    /// outside the normal claim-batch cycle. Skipped if already in flight.
    pub async fn process_single(
        &self,
        id: Uuid,
    ) -> Result<EmbeddingTickStats, logsink_storage::StorageError> {
        let mut stats = EmbeddingTickStats::default();
        if !self.in_flight.lock().await.insert(id) {
            return Ok(stats);
        }
        let issue = self.store.get_by_id(id).await;
        let result = match issue {
            Ok(issue) => {
                self.process_one(&issue, &mut stats).await;
                Ok(stats)
            },
            Err(err) => Err(err),
        };
        self.in_flight.lock().await.remove(&id);
        result
    }

    /// Processes up to `config.batch_size` pending issues, claiming and
    /// releasing each one from the in-flight set around its own processing.
    async fn tick(&self) -> EmbeddingTickStats {
        let mut stats = EmbeddingTickStats::default();
        let exclude: Vec<Uuid> = self.in_flight.lock().await.iter().copied().collect();

        let claimed = match self.store.claim_pending_batch(self.config.batch_size, &exclude).await {
            Ok(issues) => issues,
            Err(err) => {
                tracing::error!(error = %err, "failed to claim pending issues");
                return stats;
            },
        };
        stats.claimed = claimed.len() as u64;

        for issue in claimed {
            self.in_flight.lock().await.insert(issue.id);
            self.process_one(&issue, &mut stats).await;
            self.in_flight.lock().await.remove(&issue.id);
        }
        stats
    }

    /// Drives one claimed issue through the per-item steps of §4.4: embed,
    /// find neighbors, merge into the best candidate or promote to `open`.
    async fn process_one(&self, issue: &Issue, stats: &mut EmbeddingTickStats) {
        let text = issue_embedding_text(issue);
        let embedding = match tokio::time::timeout(
            Duration::from_millis(self.config.timeout_ms),
            self.client.embed(&text),
        )
        .await
        {
            Ok(Ok(embedding)) => embedding,
            Ok(Err(err)) => {
                tracing::warn!(issue_id = %issue.id, error = %err, "embedding call failed, falling back to open");
                self.fallback(issue.id, stats).await;
                return;
            },
            Err(_) => {
                tracing::warn!(issue_id = %issue.id, "embedding call timed out, falling back to open");
                self.fallback(issue.id, stats).await;
                return;
            },
        };

        if embedding.is_empty() || is_zero_vector(&embedding) {
            tracing::warn!(issue_id = %issue.id, "embedding provider returned a degenerate vector");
            self.fallback(issue.id, stats).await;
            return;
        }

        let neighbors = match self
            .store
            .find_similar(
                &issue.application_id,
                &embedding,
                NEIGHBOR_QUERY_LIMIT,
                self.config.similarity_threshold,
            )
            .await
        {
            Ok(neighbors) => neighbors,
            Err(err) => {
                tracing::error!(issue_id = %issue.id, error = %err, "similarity query failed");
                Vec::new()
            },
        };

        let candidate = neighbors
            .into_iter()
            .filter(|n| matches!(n.state, IssueState::Open | IssueState::InProgress | IssueState::Done))
            .max_by(|a, b| a.similarity.total_cmp(&b.similarity));

        if let Some(candidate) = candidate {
            if let Err(err) = self.merge_into(issue, candidate.issue_id).await {
                tracing::error!(
                    issue_id = %issue.id, target = %candidate.issue_id, error = %err,
                    "merge transaction failed"
                );
            } else {
                stats.merged += 1;
            }
            return;
        }

        match self.store.save_embedding_and_promote(issue.id, embedding, &self.model).await {
            Ok(_) => stats.promoted += 1,
            Err(err) => tracing::error!(issue_id = %issue.id, error = %err, "failed to persist embedding"),
        }
    }

    async fn fallback(&self, id: Uuid, stats: &mut EmbeddingTickStats) {
        match self.store.fallback_to_open(id).await {
            Ok(_) => stats.fallback += 1,
            Err(err) => tracing::error!(issue_id = %id, error = %err, "fallback-to-open failed"),
        }
    }

    async fn merge_into(&self, source: &Issue, target_id: Uuid) -> Result<(), logsink_storage::StorageError> {
        let target = self.store.get(&source.application_id, target_id).await?;
        let merge = compute_absorb_merge(
            &target,
            source,
            Some("semantic-similarity"),
            chrono::Utc::now(),
            MergeWinner::Source,
        );
        self.store
            .merge_issue(
                target_id,
                source.id,
                merge.context,
                merge.screenshots,
                i64::from(merge.reopen_count),
                EMBEDDING_MERGE_EDGE_SCORE,
            )
            .await
    }
}

/// Runs the worker's own timer loop until `shutdown` fires, also honoring
/// explicit triggers sent over `trigger_rx` (e.g. `POST /embedding/process`).
pub async fn run_embedding_worker_loop(
    worker: Arc<EmbeddingWorker>,
    mut trigger_rx: mpsc::Receiver<()>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(worker.config.tick_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let stats = worker.try_tick().await;
                log_tick(stats);
            },
            Some(()) = trigger_rx.recv() => {
                let stats = worker.try_tick().await;
                log_tick(stats);
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("embedding worker shutting down");
                    break;
                }
            },
        }
    }
}

fn log_tick(stats: Option<EmbeddingTickStats>) {
    match stats {
        Some(stats) => tracing::info!(
            claimed = stats.claimed, merged = stats.merged,
            promoted = stats.promoted, fallback = stats.fallback,
            "embedding worker tick complete"
        ),
        None => tracing::debug!("embedding worker tick skipped: already running"),
    }
}

//! `logsink serve`: wires the Store, Admission Pipeline, Lifecycle Engine,
//! Blacklist Cache, Embedding Worker and Cleanup Scheduler behind the
//! HTTP API, then serves until `SIGINT`/`SIGTERM`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use logsink_blacklist::BlacklistCache;
use logsink_embeddings::EmbeddingClient;
use logsink_http::{create_router, AppState};
use logsink_images::ImageExtractor;
use logsink_llm::LlmClient;
use logsink_service::{
    AdmissionConfig, AdmissionPipeline, BlacklistConfig, CleanupConfig, CleanupScheduler,
    EmbeddingClientConfig, EmbeddingWorker, EmbeddingWorkerConfig, LifecycleConfig, LifecycleEngine,
    LlmConfig,
};
use logsink_storage::{IssueStore, PgStore, PoolOptions};
use tokio::sync::{mpsc, watch};

use super::env;

pub async fn run(host: String, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or_else(|| logsink_core::env_parse_with_default("PORT", 37777u16));
    let database_url = env::database_url()?;
    let pg_store = Arc::new(PgStore::connect(&database_url, PoolOptions::default()).await?);
    let store: Arc<dyn IssueStore> = pg_store.clone();

    let admission_config = AdmissionConfig::default();
    let lifecycle_config = LifecycleConfig::default();
    let embedding_worker_config = EmbeddingWorkerConfig::default();
    let cleanup_config = CleanupConfig::default();
    let blacklist_config = BlacklistConfig::default();
    let llm_config = LlmConfig::default();
    let embedding_client_config = EmbeddingClientConfig::default();

    let images_dir = PathBuf::from(&admission_config.images_dir);
    let images = Arc::new(
        ImageExtractor::new(
            images_dir.clone(),
            admission_config.max_image_size_bytes,
            admission_config.allowed_image_types.clone(),
        )
        .await?,
    );

    let blacklist_source: Arc<dyn logsink_blacklist::BlacklistSource> = pg_store.clone();
    let blacklist = Arc::new(BlacklistCache::new(
        blacklist_source,
        Duration::from_millis(blacklist_config.cache_ttl_ms),
    ));
    if blacklist_config.enabled {
        blacklist.refresh().await?;
    }

    let embedding_client = Arc::new(EmbeddingClient::new(
        embedding_client_config.api_url.clone(),
        embedding_client_config.api_key.clone(),
        embedding_client_config.model.clone(),
        Duration::from_millis(embedding_worker_config.timeout_ms),
    ));

    let llm = llm_config.enabled.then(|| {
        LlmClient::new(llm_config.api_key.clone(), llm_config.base_url.clone())
            .with_model(llm_config.model.clone())
            .with_sampling(llm_config.max_tokens, llm_config.temperature)
    });

    let admission = Arc::new(AdmissionPipeline::new(
        Arc::clone(&store),
        Arc::clone(&blacklist),
        Arc::clone(&images),
        lifecycle_config,
    ));
    let lifecycle = Arc::new(LifecycleEngine::new(Arc::clone(&store), lifecycle_config));
    let embedding_worker = Arc::new(EmbeddingWorker::new(
        Arc::clone(&store),
        (*embedding_client).clone(),
        embedding_client_config.model.clone(),
        embedding_worker_config.clone(),
    ));
    let cleanup =
        Arc::new(CleanupScheduler::new(Arc::clone(&store), images_dir.clone(), llm, cleanup_config.clone()));

    let (_embedding_trigger_tx, embedding_trigger_rx) = mpsc::channel(1);
    let (_cleanup_trigger_tx, cleanup_trigger_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if embedding_worker_config.enabled {
        let worker = Arc::clone(&embedding_worker);
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(logsink_service::run_embedding_worker_loop(worker, embedding_trigger_rx, shutdown_rx));
    }
    if cleanup_config.enabled {
        let scheduler = Arc::clone(&cleanup);
        let cron = cleanup_config.cron.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(logsink_service::run_cleanup_scheduler_loop(scheduler, cron, cleanup_trigger_rx, shutdown_rx));
    }

    let state = Arc::new(AppState {
        store,
        admission,
        lifecycle,
        blacklist,
        blacklist_auto_delete: blacklist_config.auto_delete,
        embedding_worker,
        embedding_worker_config,
        embedding_client: Some(embedding_client),
        cleanup,
        cleanup_config,
        images_dir,
        api_key: env::api_key()?,
    });

    let router = create_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "logsink listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal(shutdown_tx)).await?;
    Ok(())
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async { tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler") };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received, draining background workers");
    let _ = shutdown_tx.send(true);
}

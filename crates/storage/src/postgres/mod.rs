//! Postgres + pgvector implementation of [`crate::IssueStore`].
//!
//! Split into modular files by domain concern, one per CRUD surface.

mod blacklist;
mod cleanup;
mod embedding_worker;
mod issues;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::StorageError;

/// Connection-pool tuning, read from the environment by `logsink-cli`.
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long an idle connection may sit in the pool before being closed.
    pub idle_timeout: Duration,
    /// How long to wait for a connection before giving up.
    pub connect_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: logsink_core::PG_POOL_MAX_CONNECTIONS,
            idle_timeout: Duration::from_secs(logsink_core::PG_POOL_IDLE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(logsink_core::PG_POOL_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

/// The Store's Postgres backend. Cheap to clone (wraps a pooled
/// connection handle); share one instance across handlers and workers.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to `database_url`, running every pending migration before
    /// returning.
    pub async fn connect(database_url: &str, options: PoolOptions) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .idle_timeout(options.idle_timeout)
            .acquire_timeout(options.connect_timeout)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("connected to store and ran migrations");
        Ok(Self { pool })
    }

    /// Wraps an already-connected pool (used by tests that set up their
    /// own fixture database).
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

//! `logsink migrate`: runs pending migrations and exits.

use anyhow::Result;
use logsink_storage::{PgStore, PoolOptions};

use super::env;

pub async fn run() -> Result<()> {
    let database_url = env::database_url()?;
    PgStore::connect(&database_url, PoolOptions::default()).await?;
    tracing::info!("migrations applied");
    Ok(())
}

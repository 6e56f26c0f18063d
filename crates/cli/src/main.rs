//! `logsink` server binary.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "logsink")]
#[command(about = "Issue-sink service: admission, lifecycle, dedup and cleanup over Postgres", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs pending migrations then starts the HTTP server.
    Serve {
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Overrides `PORT` (default 37777) for this run.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Runs pending migrations and exits.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(host, port).await?,
        Commands::Migrate => commands::migrate::run().await?,
    }

    Ok(())
}

//! Heroes CLI
//!
//! Command-line interface for managing heroes stored in Postgres.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use heroes_store::{PgExecutor, db};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "heroes")]
#[command(about = "Heroes data-access CLI", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS")]
    max_connections: Option<u32>,

    /// Skip creating collection tables on startup
    #[arg(long)]
    no_migrate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heroes_store=info,heroes_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.database_url, cli.max_connections, !cli.no_migrate);

    tracing::debug!(
        "Connecting to database (max_connections={})",
        config.store.max_connections
    );

    let pool = db::create_pool(&config.store)
        .await
        .context("Failed to create database pool")?;

    if config.migrate {
        db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let executor = PgExecutor::new(pool);

    handle_command(cli.command, &executor).await
}

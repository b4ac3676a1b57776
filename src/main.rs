use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use estate_api::config::{self, StoreBackend};
use estate_api::database::{DocumentStore, MemoryStore, PgStore};
use estate_api::services::mailer::LogMailer;
use estate_api::AppState;

#[derive(Parser)]
#[command(name = "estate-api")]
#[command(about = "Estate API - real-estate marketplace backend")]
#[command(version)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 3000, help = "Port to listen on")]
    port: u16,

    #[arg(long, help = "Use the in-memory store regardless of STORE_BACKEND")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("estate_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = config::config().clone();
    if args.memory {
        config.database.backend = StoreBackend::Memory;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;
    tracing::info!("Starting Estate API in {:?} mode", config.environment);

    let store: Arc<dyn DocumentStore> = match config.database.backend {
        StoreBackend::Postgres => Arc::new(
            PgStore::connect(&config.database)
                .await
                .context("failed to connect to postgres")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store.clone(), config, Arc::new(LogMailer));
    let app = estate_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Estate API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

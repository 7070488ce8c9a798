//! # xFinance Worker
//!
//! Runs the audit log retention loop until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/xfinance cargo run -p xfinance-worker
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xfinance_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use xfinance_worker::{config::WorkerConfig, retention::RetentionWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("xFinance Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: config.max_connections,
        ..Default::default()
    })
    .await?;

    let worker = RetentionWorker::new(pool.clone(), config.retention.clone());

    let token = worker.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
        token.cancel();
    });

    worker.run().await?;

    close_pool(pool).await;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "xfinance_worker=debug,xfinance_shared=info".into());

    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

//! # xFinance API Server
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/xfinance JWT_SECRET=... cargo run -p xfinance-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xfinance_api::{
    app::{build_router, AppState},
    bootstrap::{ensure_admin, BootstrapOutcome},
    config::Config,
};
use xfinance_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("xFinance API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    match ensure_admin(&pool, config.admin.as_ref()).await? {
        BootstrapOutcome::Created { username } => tracing::info!(%username, "Created admin user"),
        BootstrapOutcome::Skipped => tracing::debug!("Users exist, admin bootstrap skipped"),
        BootstrapOutcome::NotConfigured => tracing::debug!("No admin configured"),
    }

    let address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "xfinance_api=debug,xfinance_shared=info,tower_http=debug".into());

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

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

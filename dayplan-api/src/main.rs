//! # Dayplan API Server
//!
//! The HTTP entry point for Dayplan: authentication, daily task
//! scheduling with overlap detection, and per-day completion tracking.
//!
//! ## Startup sequence
//!
//! 1. Initialize tracing from `RUST_LOG`
//! 2. Load configuration from the environment (`.env` honored in dev)
//! 3. Create the database pool and run pending migrations
//! 4. Build the Axum router and serve until Ctrl-C
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p dayplan-api
//! ```

use dayplan_api::{
    app::{build_router, AppState},
    config::Config,
};
use dayplan_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dayplan_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Dayplan API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(config.pool_config()).await?;
    migrations::run_migrations(&db).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

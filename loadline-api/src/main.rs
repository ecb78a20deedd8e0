//! # Loadline API Server
//!
//! HTTP API for the Loadline transportation-management platform: tenancy
//! and selection, feature gates, fleet and load CRUD, the Load Hunter inbound
//! queue, and billing reports.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p loadline-api
//! ```

use loadline_api::{app, config::Config};
use loadline_shared::db;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadline_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Loadline API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let pool = db::create_pool(config.database()).await?;
    db::migrations::run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = app::AppState::new(pool, config);
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    Ok(())
}

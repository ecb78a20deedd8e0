//! # Loadline Ingestion Worker
//!
//! Drains the inbound email queue: parses broker load offers, runs credit
//! checks, creates loads, and matches them against active hunt plans.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p loadline-worker
//! ```

use loadline_shared::db;
use loadline_worker::config::WorkerConfig;
use loadline_worker::credit::{CreditCheckClient, DisabledCreditClient, HttpCreditClient};
use loadline_worker::processor::Processor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loadline_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Loadline Ingestion Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;
    let pool = db::create_pool(config.database()).await?;
    db::migrations::run_migrations(&pool).await?;

    let credit: Arc<dyn CreditCheckClient> = match config.credit_check_url.clone() {
        Some(url) => {
            tracing::info!(url = %url, "broker credit checks enabled");
            Arc::new(HttpCreditClient::new(url))
        }
        None => {
            tracing::info!("no CREDIT_CHECK_URL set, brokers will rate unknown");
            Arc::new(DisabledCreditClient)
        }
    };

    let processor = Processor::new(pool, credit, config);
    let shutdown = CancellationToken::new();

    let worker = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { processor.run(shutdown).await })
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, draining...");
    shutdown.cancel();

    worker.await?;
    tracing::info!("Worker exited cleanly");

    Ok(())
}

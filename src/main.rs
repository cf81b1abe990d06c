use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use recent_rides::config::Config;
use recent_rides::dashboard::start_status_server;
use recent_rides::error::Result;
use recent_rides::store::{self, DocumentStore};
use recent_rides::RidesEngine;

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    info!("Recent rides service v{} starting", env!("CARGO_PKG_VERSION"));

    let client: Arc<dyn DocumentStore> = store::shared(&config.store)?;
    let engine = RidesEngine::new(client, &config);
    let shutdown = CancellationToken::new();

    let mut jobs = engine.spawn_jobs(shutdown.clone());

    if config.server.status_enabled {
        let engine = engine.clone();
        let host = config.server.host.clone();
        let port = config.server.status_port;
        let shutdown = shutdown.clone();
        jobs.push(tokio::spawn(async move {
            if let Err(e) = start_status_server(engine, &host, port, shutdown).await {
                error!("{}", e);
            }
        }));
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
    shutdown.cancel();

    for job in jobs {
        let _ = job.await;
    }
    Ok(())
}

//! Forecast server: liquidation-risk and APY-trend predictions over HTTP.
//!
//! # Usage
//! ```sh
//! MODEL_DIR=models SERVER_PORT=8001 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `MODEL_DIR` - Directory holding trained artifacts (default: models)
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - Listener (default: 0.0.0.0:8001)
//! - `OBSERVABILITY_ENABLED` - Enable metrics reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between metric outputs (default: 60)
//! - `PERSIST_ON_SHUTDOWN` - Write models back on Ctrl+C (default: false)
//!
//! Send `SIGHUP` to reload artifacts from `MODEL_DIR` without a restart.

use anyhow::{Context, Result};
use defi_forecast::application::bootstrap::build_service;
use defi_forecast::application::forecast_service::ForecastService;
use defi_forecast::config::Config;
use defi_forecast::infrastructure::observability::{Metrics, MetricsReporter};
use defi_forecast::interfaces::router;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Forecast server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: ModelDir={:?}, Listen={}",
        config.model.model_dir,
        config.server.socket_address()
    );

    let metrics = Metrics::new().context("Failed to create metrics registry")?;
    let service = build_service(&config.model, metrics);

    if config.observability.enabled {
        let reporter = MetricsReporter::new(service.clone(), config.observability.interval_seconds);
        tokio::spawn(async move {
            reporter.run().await;
        });
        info!(
            "Metrics reporter started (interval: {}s)",
            config.observability.interval_seconds
        );
    } else {
        info!("Metrics reporting disabled.");
    }

    #[cfg(unix)]
    spawn_reload_on_sighup(service.clone())?;

    let address = config.server.socket_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}. Press Ctrl+C to shutdown.", address);

    axum::serve(listener, router(service.clone()))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received.");
        })
        .await
        .context("HTTP server failed")?;

    if config.model.persist_on_shutdown {
        service
            .persist()
            .await
            .context("Failed to persist models on shutdown")?;
    }

    info!("Exiting...");
    Ok(())
}

/// Reloads both artifacts each time the process receives SIGHUP.
#[cfg(unix)]
fn spawn_reload_on_sighup(service: Arc<ForecastService>) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received. Reloading models...");
            match service.reload().await {
                Ok(status) => info!(
                    "Models reloaded (risk: {}, apy_trend: {})",
                    status.risk_trained, status.trend_trained
                ),
                Err(e) => warn!("Model reload failed: {}", e),
            }
        }
    });
    Ok(())
}

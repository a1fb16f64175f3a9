//! Push-based metrics reporter
//!
//! Periodically outputs a service snapshot as structured JSON to stdout.

use crate::application::forecast_service::ForecastService;
use crate::domain::ml::PredictorKind;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub models: ModelsSnapshot,
    pub predictions: PredictionsSnapshot,
}

#[derive(Serialize)]
pub struct ModelsSnapshot {
    pub risk_trained: bool,
    pub trend_trained: bool,
}

#[derive(Serialize)]
pub struct PredictionsSnapshot {
    pub risk_model: u64,
    pub risk_heuristic: u64,
    pub trend_model: u64,
    pub trend_heuristic: u64,
}

pub struct MetricsReporter {
    service: Arc<ForecastService>,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(service: Arc<ForecastService>, interval_seconds: u64) -> Self {
        Self {
            service,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot().await;
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    // Prefix keeps the line easy to filter in log pipelines
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Models: risk={} apy_trend={} | Uptime: {}s",
                        snapshot.models.risk_trained,
                        snapshot.models.trend_trained,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
        }
    }

    async fn collect_snapshot(&self) -> MetricsSnapshot {
        let status = self.service.status().await;
        let metrics = self.service.metrics();
        let uptime = self.start_time.elapsed().as_secs();
        metrics.uptime_seconds.set(uptime as f64);

        let count = |kind: PredictorKind, mode: &str| metrics.prediction_count(kind.label(), mode) as u64;

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            models: ModelsSnapshot {
                risk_trained: status.risk_trained,
                trend_trained: status.trend_trained,
            },
            predictions: PredictionsSnapshot {
                risk_model: count(PredictorKind::RiskForecaster, "model"),
                risk_heuristic: count(PredictorKind::RiskForecaster, "heuristic"),
                trend_model: count(PredictorKind::ApyTrend, "model"),
                trend_heuristic: count(PredictorKind::ApyTrend, "heuristic"),
            },
        }
    }
}

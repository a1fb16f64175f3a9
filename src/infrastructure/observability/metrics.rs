//! Prometheus metrics definitions for the forecast service
//!
//! All metrics use the `forecast_` prefix.

use prometheus::{
    CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Predictions served by predictor and computation path
    pub predictions_total: CounterVec,
    /// Requests by endpoint and outcome
    pub requests_total: CounterVec,
    /// Whether a predictor has a trained model (0/1)
    pub model_trained: GenericGaugeVec<AtomicF64>,
    /// Request handling latency
    pub request_latency_seconds: HistogramVec,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new(
                "forecast_predictions_total",
                "Predictions served by predictor and mode",
            ),
            &["predictor", "mode"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let requests_total = CounterVec::new(
            Opts::new("forecast_requests_total", "Requests by endpoint and status"),
            &["endpoint", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let model_trained = GaugeVec::new(
            Opts::new(
                "forecast_model_trained",
                "Trained model loaded (0=heuristic, 1=model)",
            ),
            &["predictor"],
        )?;
        registry.register(Box::new(model_trained.clone()))?;

        let request_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "forecast_request_latency_seconds",
                "Request handling latency in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_latency_seconds.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "forecast_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            requests_total,
            model_trained,
            request_latency_seconds,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_prediction(&self, predictor: &str, mode: &str) {
        self.predictions_total
            .with_label_values(&[predictor, mode])
            .inc();
    }

    pub fn prediction_count(&self, predictor: &str, mode: &str) -> f64 {
        self.predictions_total
            .with_label_values(&[predictor, mode])
            .get()
    }

    pub fn inc_request(&self, endpoint: &str, status: &str) {
        self.requests_total
            .with_label_values(&[endpoint, status])
            .inc();
    }

    pub fn set_model_trained(&self, predictor: &str, trained: bool) {
        self.model_trained
            .with_label_values(&[predictor])
            .set(if trained { 1.0 } else { 0.0 });
    }

    pub fn observe_latency(&self, endpoint: &str, latency: f64) {
        self.request_latency_seconds
            .with_label_values(&[endpoint])
            .observe(latency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.uptime_seconds.set(12.0);
        assert!(metrics.render().contains("forecast_"));
    }

    #[test]
    fn test_prediction_counter() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_prediction("risk", "heuristic");
        metrics.inc_prediction("risk", "heuristic");
        metrics.inc_prediction("apy_trend", "model");

        assert_eq!(metrics.prediction_count("risk", "heuristic"), 2.0);
        assert_eq!(metrics.prediction_count("apy_trend", "model"), 1.0);
        let output = metrics.render();
        assert!(output.contains("forecast_predictions_total"));
        assert!(output.contains("heuristic"));
    }

    #[test]
    fn test_model_trained_gauge() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.set_model_trained("risk", true);
        metrics.set_model_trained("apy_trend", false);
        let output = metrics.render();
        assert!(output.contains("forecast_model_trained{predictor=\"risk\"} 1"));
        assert!(output.contains("forecast_model_trained{predictor=\"apy_trend\"} 0"));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_request("risk_forecast", "ok");
        metrics.observe_latency("risk_forecast", 0.002);
        let output = metrics.render();
        assert!(output.contains("forecast_requests_total"));
        assert!(output.contains("forecast_request_latency_seconds"));
    }
}

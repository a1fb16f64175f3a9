//! Observability for the forecast service
//!
//! 1. **Prometheus text**: served on `GET /metrics`
//! 2. **Structured JSON Logs**: periodic `METRICS_JSON:` lines on stdout

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::MetricsReporter;

use crate::application::forecast_service::ForecastService;
use crate::application::ml::{Predictor, RiskPredictor, TrendPredictor};
use crate::config::ModelEnvConfig;
use crate::domain::ports::ModelStore;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::FileModelStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the shared service from configuration.
///
/// Artifacts that are missing, unreadable or mismatched leave the
/// corresponding predictor untrained; startup never fails on them.
pub fn build_service(config: &ModelEnvConfig, metrics: Metrics) -> Arc<ForecastService> {
    info!("Model directory: {:?}", config.model_dir);
    let store: Arc<dyn ModelStore> = Arc::new(FileModelStore::new(&config.model_dir));
    build_service_with_store(config, store, metrics)
}

pub fn build_service_with_store(
    config: &ModelEnvConfig,
    store: Arc<dyn ModelStore>,
    metrics: Metrics,
) -> Arc<ForecastService> {
    let mut risk = RiskPredictor::new(config.risk_params);
    let mut trend = TrendPredictor::new(config.trend_params);

    load_or_warn(&mut risk, store.as_ref());
    load_or_warn(&mut trend, store.as_ref());

    info!(
        "Predictors ready (risk: {}, apy_trend: {})",
        mode_name(risk.is_trained()),
        mode_name(trend.is_trained())
    );

    Arc::new(ForecastService::new(risk, trend, store, metrics))
}

fn load_or_warn<P: Predictor>(predictor: &mut P, store: &dyn ModelStore) {
    if let Err(e) = predictor.load(store) {
        warn!(
            "Could not load {} model, using heuristic: {}",
            predictor.kind(),
            e
        );
    }
}

fn mode_name(trained: bool) -> &'static str {
    if trained { "model" } else { "heuristic" }
}

//! Request-facing forecasting service.
//!
//! Built once at startup and shared with handlers as `Arc<ForecastService>`.
//! Each predictor sits behind its own `RwLock`: predictions take read guards
//! and run in parallel, while retrain/reload take the write guard so a
//! reader never sees a half-swapped model and scaler.

use crate::application::ml::training::fit_artifact;
use crate::application::ml::{
    ForestParams, PredictionMode, Predictor, RiskPredictor, TrendPredictor,
};
use crate::domain::errors::ForecastError;
use crate::domain::forecast::{
    ApyTrendRequest, ApyTrendResponse, RiskForecastRequest, RiskForecastResponse, RiskLevel,
    risk_confidence, round2, trend_confidence, trend_recommendation,
};
use crate::domain::ml::feature_registry::DEFAULT_APY;
use crate::domain::ml::{ModelArtifact, PredictorKind};
use crate::domain::ports::ModelStore;
use crate::infrastructure::observability::Metrics;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Which predictors currently serve from a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub risk_trained: bool,
    pub trend_trained: bool,
}

pub struct ForecastService {
    risk: RwLock<RiskPredictor>,
    trend: RwLock<TrendPredictor>,
    store: Arc<dyn ModelStore>,
    metrics: Metrics,
}

impl ForecastService {
    pub fn new(
        risk: RiskPredictor,
        trend: TrendPredictor,
        store: Arc<dyn ModelStore>,
        metrics: Metrics,
    ) -> Self {
        metrics.set_model_trained(PredictorKind::RiskForecaster.label(), risk.is_trained());
        metrics.set_model_trained(PredictorKind::ApyTrend.label(), trend.is_trained());
        Self {
            risk: RwLock::new(risk),
            trend: RwLock::new(trend),
            store,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn status(&self) -> ModelStatus {
        ModelStatus {
            risk_trained: self.risk.read().await.is_trained(),
            trend_trained: self.trend.read().await.is_trained(),
        }
    }

    /// Liquidation-risk forecast. Always succeeds; missing inputs take defaults.
    pub async fn forecast_risk(&self, request: &RiskForecastRequest) -> RiskForecastResponse {
        let features = request.to_features();

        let (risk, mode, trained) = {
            let predictor = self.risk.read().await;
            let (risk, mode) = predictor.predict_with_mode(&features);
            (risk, mode, predictor.is_trained())
        };
        self.record_prediction(PredictorKind::RiskForecaster, mode);

        let risk_level = RiskLevel::from_score(risk);
        debug!(
            "Risk forecast for {}: {:.3} ({}, {})",
            request.user_address,
            risk,
            risk_level,
            mode.as_str()
        );

        RiskForecastResponse {
            liquidation_risk: risk,
            risk_level,
            recommendations: risk_level
                .recommendations()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            confidence: risk_confidence(trained),
        }
    }

    /// APY trend analysis. Rejects histories shorter than two points.
    pub async fn analyze_apy_trend(
        &self,
        request: &ApyTrendRequest,
    ) -> Result<ApyTrendResponse, ForecastError> {
        request.validate()?;
        let history = &request.historical_apy;

        let (predicted, mode, trend, trained) = {
            let predictor = self.trend.read().await;
            let (predicted, mode) = predictor.predict_with_mode(history);
            let trend = predictor.predict_trend(history);
            (predicted, mode, trend, predictor.is_trained())
        };
        self.record_prediction(PredictorKind::ApyTrend, mode);

        let current_apy = history.last().copied().unwrap_or(DEFAULT_APY);
        debug!(
            "APY trend for {}/{}: {:.3} -> {} ({})",
            request.protocol,
            request.asset,
            predicted,
            trend,
            mode.as_str()
        );

        Ok(ApyTrendResponse {
            predicted_apy: round2(predicted),
            trend,
            confidence: trend_confidence(trained, history.len()),
            recommendation: trend_recommendation(trend, predicted, current_apy),
        })
    }

    /// Fits a new risk model off the async runtime, then swaps it in.
    pub async fn retrain_risk(&self, x: Vec<Vec<f64>>, y: Vec<f64>) -> Result<(), ForecastError> {
        let params = self.risk.read().await.params();
        let artifact = Self::fit_blocking(PredictorKind::RiskForecaster, x, y, params).await?;
        self.risk.write().await.install(artifact)?;
        self.metrics
            .set_model_trained(PredictorKind::RiskForecaster.label(), true);
        info!("Risk model retrained");
        Ok(())
    }

    pub async fn retrain_trend(&self, x: Vec<Vec<f64>>, y: Vec<f64>) -> Result<(), ForecastError> {
        let params = self.trend.read().await.params();
        let artifact = Self::fit_blocking(PredictorKind::ApyTrend, x, y, params).await?;
        self.trend.write().await.install(artifact)?;
        self.metrics
            .set_model_trained(PredictorKind::ApyTrend.label(), true);
        info!("APY trend model retrained");
        Ok(())
    }

    /// Re-reads both artifacts from the store. Missing artifacts leave the
    /// predictor as it is. Both predictors are attempted before an error is
    /// returned.
    pub async fn reload(&self) -> Result<ModelStatus, ForecastError> {
        let risk = self.reload_predictor(&self.risk).await;
        let trend = self.reload_predictor(&self.trend).await;
        risk?;
        trend?;
        Ok(self.status().await)
    }

    /// Writes every trained artifact back to the store.
    pub async fn persist(&self) -> Result<(), ForecastError> {
        let risk_saved = self.risk.read().await.save(self.store.as_ref())?;
        let trend_saved = self.trend.read().await.save(self.store.as_ref())?;
        info!(
            "Persisted models (risk: {}, apy_trend: {})",
            risk_saved, trend_saved
        );
        Ok(())
    }

    fn record_prediction(&self, kind: PredictorKind, mode: PredictionMode) {
        self.metrics.inc_prediction(kind.label(), mode.as_str());
    }

    async fn fit_blocking(
        kind: PredictorKind,
        x: Vec<Vec<f64>>,
        y: Vec<f64>,
        params: ForestParams,
    ) -> Result<ModelArtifact, ForecastError> {
        tokio::task::spawn_blocking(move || fit_artifact(kind, &x, &y, params))
            .await
            .map_err(|e| ForecastError::ModelFit {
                reason: format!("Training task failed: {}", e),
            })?
    }

    /// Reads the artifact off the runtime, then takes the write lock only to
    /// install it. The trained gauge is refreshed whatever the outcome.
    async fn reload_predictor<P: Predictor>(&self, lock: &RwLock<P>) -> Result<bool, ForecastError> {
        let kind = lock.read().await.kind();
        let result = match Self::load_blocking(self.store.clone(), kind).await {
            Ok(Some(artifact)) => lock.write().await.install(artifact).map(|()| true),
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };

        match &result {
            Ok(true) => info!("Reloaded {} model", kind),
            Ok(false) => warn!("No {} model artifact found, keeping current state", kind),
            Err(e) => warn!("Failed to reload {} model: {}", kind, e),
        }
        self.metrics
            .set_model_trained(kind.label(), lock.read().await.is_trained());
        result
    }

    async fn load_blocking(
        store: Arc<dyn ModelStore>,
        kind: PredictorKind,
    ) -> Result<Option<ModelArtifact>, ForecastError> {
        tokio::task::spawn_blocking(move || store.load(kind))
            .await
            .map_err(|e| ForecastError::Store(anyhow::anyhow!("Load task failed: {}", e)))?
            .map_err(ForecastError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::synthetic::SyntheticDataGenerator;
    use crate::domain::forecast::TrendLabel;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryModelStore {
        saved: Mutex<HashMap<PredictorKind, String>>,
    }

    impl ModelStore for InMemoryModelStore {
        fn load(&self, kind: PredictorKind) -> anyhow::Result<Option<ModelArtifact>> {
            let saved = self.saved.lock().unwrap();
            match saved.get(&kind) {
                Some(json) => Ok(Some(serde_json::from_str(json)?)),
                None => Ok(None),
            }
        }

        fn save(&self, artifact: &ModelArtifact) -> anyhow::Result<()> {
            let json = serde_json::to_string(artifact)?;
            self.saved.lock().unwrap().insert(artifact.kind, json);
            Ok(())
        }
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 8,
            max_depth: 5,
            min_samples_split: 2,
        }
    }

    fn service_with(store: Arc<InMemoryModelStore>) -> ForecastService {
        ForecastService::new(
            RiskPredictor::new(small_params()),
            TrendPredictor::new(small_params()),
            store,
            Metrics::new().unwrap(),
        )
    }

    fn risk_request(collateral: f64, debt: f64) -> RiskForecastRequest {
        RiskForecastRequest {
            user_address: "0x0000000000000000000000000000000000000001".to_string(),
            positions: vec![],
            health_factor: None,
            total_collateral: Some(collateral),
            total_debt: Some(debt),
        }
    }

    fn trend_request(history: Vec<f64>) -> ApyTrendRequest {
        ApyTrendRequest {
            protocol: "aave".to_string(),
            asset: "USDC".to_string(),
            historical_apy: history,
            days: 30,
        }
    }

    #[tokio::test]
    async fn test_untrained_risk_scenario() {
        let service = service_with(Arc::new(InMemoryModelStore::default()));
        let response = service.forecast_risk(&risk_request(1000.0, 500.0)).await;

        assert_eq!(response.liquidation_risk, 0.1);
        assert_eq!(response.risk_level, RiskLevel::Low);
        assert_eq!(response.confidence, 0.65);
        assert_eq!(
            response.recommendations,
            vec!["Portfolio is in good health", "Continue monitoring"]
        );
        assert_eq!(service.metrics().prediction_count("risk", "heuristic"), 1.0);
    }

    #[tokio::test]
    async fn test_untrained_critical_scenario() {
        let service = service_with(Arc::new(InMemoryModelStore::default()));
        // hf = 1000 * 0.8 / 900 ≈ 0.89
        let response = service.forecast_risk(&risk_request(1000.0, 900.0)).await;

        assert_eq!(response.liquidation_risk, 0.9);
        assert_eq!(response.risk_level, RiskLevel::Critical);
        assert_eq!(response.recommendations.len(), 3);
    }

    #[tokio::test]
    async fn test_trend_rejects_short_history() {
        let service = service_with(Arc::new(InMemoryModelStore::default()));
        let result = service.analyze_apy_trend(&trend_request(vec![5.0])).await;

        assert!(matches!(
            result,
            Err(ForecastError::InsufficientHistory { actual: 1, .. })
        ));
        assert_eq!(service.metrics().prediction_count("apy_trend", "heuristic"), 0.0);
    }

    #[tokio::test]
    async fn test_untrained_trend_response() {
        let service = service_with(Arc::new(InMemoryModelStore::default()));
        let response = service
            .analyze_apy_trend(&trend_request(vec![4.0, 4.123, 4.2]))
            .await
            .unwrap();

        assert_eq!(response.predicted_apy, 4.11);
        assert_eq!(response.trend, TrendLabel::Stable);
        assert_eq!(response.confidence, 0.60);
        assert_eq!(
            response.recommendation,
            "APY expected to remain stable. Current position is optimal"
        );
    }

    #[tokio::test]
    async fn test_retrain_switches_to_model() {
        let service = service_with(Arc::new(InMemoryModelStore::default()));
        let mut generator = SyntheticDataGenerator::new(3);
        let (x_risk, y_risk) = generator.risk_dataset(200);
        let (x_apy, y_apy) = generator.apy_dataset(150, 30);

        service.retrain_risk(x_risk, y_risk).await.unwrap();
        service.retrain_trend(x_apy, y_apy).await.unwrap();

        let status = service.status().await;
        assert!(status.risk_trained && status.trend_trained);

        let risk = service.forecast_risk(&risk_request(1000.0, 500.0)).await;
        assert_eq!(risk.confidence, 0.85);
        assert!((0.0..=1.0).contains(&risk.liquidation_risk));

        let long = service
            .analyze_apy_trend(&trend_request(vec![5.0, 5.1, 5.2, 5.1, 5.0, 5.2, 5.1]))
            .await
            .unwrap();
        assert_eq!(long.confidence, 0.75);

        let short = service
            .analyze_apy_trend(&trend_request(vec![5.0, 5.1]))
            .await
            .unwrap();
        assert_eq!(short.confidence, 0.60);
    }

    #[tokio::test]
    async fn test_failed_retrain_keeps_previous_state() {
        let service = service_with(Arc::new(InMemoryModelStore::default()));
        let result = service.retrain_risk(vec![], vec![]).await;
        assert!(matches!(result, Err(ForecastError::EmptyTrainingSet)));
        assert!(!service.status().await.risk_trained);
    }

    #[tokio::test]
    async fn test_persist_and_reload_roundtrip() {
        let store = Arc::new(InMemoryModelStore::default());
        let trained = service_with(store.clone());
        let mut generator = SyntheticDataGenerator::new(5);
        let (x, y) = generator.risk_dataset(200);
        trained.retrain_risk(x, y).await.unwrap();
        trained.persist().await.unwrap();

        let fresh = service_with(store);
        assert!(!fresh.status().await.risk_trained);
        let status = fresh.reload().await.unwrap();
        assert!(status.risk_trained);
        // Nothing was saved for the trend predictor
        assert!(!status.trend_trained);

        let request = risk_request(1200.0, 900.0);
        let before = trained.forecast_risk(&request).await;
        let after = fresh.forecast_risk(&request).await;
        assert_eq!(
            before.liquidation_risk.to_bits(),
            after.liquidation_risk.to_bits()
        );
    }

    #[tokio::test]
    async fn test_partial_reload_failure_still_updates_gauges() {
        let store = Arc::new(InMemoryModelStore::default());
        let trained = service_with(store.clone());
        let (x, y) = SyntheticDataGenerator::new(8).risk_dataset(150);
        trained.retrain_risk(x, y).await.unwrap();
        trained.persist().await.unwrap();
        store
            .saved
            .lock()
            .unwrap()
            .insert(PredictorKind::ApyTrend, "garbage".to_string());

        let fresh = service_with(store);
        let result = fresh.reload().await;

        assert!(matches!(result, Err(ForecastError::Store(_))));
        let status = fresh.status().await;
        assert!(status.risk_trained);
        assert!(!status.trend_trained);

        let gauges = &fresh.metrics().model_trained;
        assert_eq!(gauges.with_label_values(&["risk"]).get(), 1.0);
        assert_eq!(gauges.with_label_values(&["apy_trend"]).get(), 0.0);
    }
}

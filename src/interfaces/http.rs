//! HTTP surface of the forecast service.
//!
//! - `GET /health`
//! - `POST /api/v1/risk/forecast`
//! - `POST /api/v1/apy/trend`
//! - `GET /metrics` (Prometheus text)
//! - `POST /api/v1/models/risk/train`, `POST /api/v1/models/apy/train`
//! - `POST /api/v1/models/reload`

use crate::application::forecast_service::{ForecastService, ModelStatus};
use crate::domain::errors::ForecastError;
use crate::domain::forecast::{
    ApyTrendRequest, ApyTrendResponse, ModelTrainingRequest, ModelTrainingResponse,
    RiskForecastRequest, RiskForecastResponse,
};
use crate::domain::ml::PredictorKind;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

const RISK_ENDPOINT: &str = "risk_forecast";
const TREND_ENDPOINT: &str = "apy_trend";
const TRAIN_ENDPOINT: &str = "model_train";
const RELOAD_ENDPOINT: &str = "model_reload";

pub fn router(service: Arc<ForecastService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/risk/forecast", post(forecast_risk))
        .route("/api/v1/apy/trend", post(predict_apy_trend))
        .route("/api/v1/models/risk/train", post(train_risk_model))
        .route("/api/v1/models/apy/train", post(train_apy_model))
        .route("/api/v1/models/reload", post(reload_models))
        .route("/metrics", get(metrics))
        .with_state(service)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "ml-service",
    })
}

async fn forecast_risk(
    State(service): State<Arc<ForecastService>>,
    Json(request): Json<RiskForecastRequest>,
) -> Json<RiskForecastResponse> {
    let started = Instant::now();
    let response = service.forecast_risk(&request).await;

    let metrics = service.metrics();
    metrics.inc_request(RISK_ENDPOINT, "ok");
    metrics.observe_latency(RISK_ENDPOINT, started.elapsed().as_secs_f64());
    Json(response)
}

async fn predict_apy_trend(
    State(service): State<Arc<ForecastService>>,
    Json(request): Json<ApyTrendRequest>,
) -> Result<Json<ApyTrendResponse>, ApiError> {
    let started = Instant::now();
    let result = service.analyze_apy_trend(&request).await;

    let metrics = service.metrics();
    metrics.inc_request(TREND_ENDPOINT, if result.is_ok() { "ok" } else { "error" });
    metrics.observe_latency(TREND_ENDPOINT, started.elapsed().as_secs_f64());
    Ok(Json(result?))
}

async fn train_risk_model(
    State(service): State<Arc<ForecastService>>,
    Json(request): Json<ModelTrainingRequest>,
) -> Result<Json<ModelTrainingResponse>, ApiError> {
    let samples = request.features.len();
    let result = service.retrain_risk(request.features, request.labels).await;
    training_response(&service, PredictorKind::RiskForecaster, samples, result)
}

async fn train_apy_model(
    State(service): State<Arc<ForecastService>>,
    Json(request): Json<ModelTrainingRequest>,
) -> Result<Json<ModelTrainingResponse>, ApiError> {
    let samples = request.features.len();
    let result = service.retrain_trend(request.features, request.labels).await;
    training_response(&service, PredictorKind::ApyTrend, samples, result)
}

fn training_response(
    service: &ForecastService,
    predictor: PredictorKind,
    samples: usize,
    result: Result<(), ForecastError>,
) -> Result<Json<ModelTrainingResponse>, ApiError> {
    service
        .metrics()
        .inc_request(TRAIN_ENDPOINT, if result.is_ok() { "ok" } else { "error" });
    result?;
    Ok(Json(ModelTrainingResponse {
        predictor,
        trained: true,
        samples,
    }))
}

async fn reload_models(
    State(service): State<Arc<ForecastService>>,
) -> Result<Json<ModelStatus>, ApiError> {
    let result = service.reload().await;
    service
        .metrics()
        .inc_request(RELOAD_ENDPOINT, if result.is_ok() { "ok" } else { "error" });
    Ok(Json(result?))
}

async fn metrics(State(service): State<Arc<ForecastService>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        service.metrics().render(),
    )
}

/// Maps core errors to `{"detail": ...}` bodies.
#[derive(Debug)]
pub struct ApiError(ForecastError);

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = if self.0.is_client_error() {
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            error!("Request failed: {}", self.0);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

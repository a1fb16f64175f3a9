use defi_forecast::application::bootstrap::build_service;
use defi_forecast::config::ModelEnvConfig;
use defi_forecast::domain::errors::ForecastError;
use defi_forecast::domain::forecast::{ApyTrendRequest, RiskForecastRequest, RiskLevel, TrendLabel};
use defi_forecast::infrastructure::observability::Metrics;
use serde_json::json;

fn untrained_config(dir: &tempfile::TempDir) -> ModelEnvConfig {
    ModelEnvConfig {
        model_dir: dir.path().to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_risk_forecast_without_models() {
    let dir = tempfile::tempdir().unwrap();
    let service = build_service(&untrained_config(&dir), Metrics::new().unwrap());

    // hf = 1000 * 0.8 / 500 = 1.6
    let request: RiskForecastRequest = serde_json::from_value(json!({
        "user_address": "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
        "positions": [],
        "total_collateral": 1000.0,
        "total_debt": 500.0
    }))
    .unwrap();

    let response = service.forecast_risk(&request).await;
    assert_eq!(response.liquidation_risk, 0.1);
    assert_eq!(response.risk_level, RiskLevel::Low);
    assert_eq!(response.confidence, 0.65);
}

#[tokio::test]
async fn test_risk_forecast_with_positions_and_explicit_health_factor() {
    let dir = tempfile::tempdir().unwrap();
    let service = build_service(&untrained_config(&dir), Metrics::new().unwrap());

    let request: RiskForecastRequest = serde_json::from_value(json!({
        "user_address": "0xabc",
        "positions": [{"asset": "ETH", "apy": 3.5}, {"asset": "DAI"}],
        "health_factor": 1.25
    }))
    .unwrap();

    let response = service.forecast_risk(&request).await;
    assert_eq!(response.liquidation_risk, 0.6);
    assert_eq!(response.risk_level, RiskLevel::High);
    assert_eq!(
        response.recommendations,
        vec![
            "Consider reducing leverage",
            "Monitor health factor closely",
            "Add collateral to improve safety margin"
        ]
    );
}

#[tokio::test]
async fn test_apy_trend_rejects_single_value() {
    let dir = tempfile::tempdir().unwrap();
    let service = build_service(&untrained_config(&dir), Metrics::new().unwrap());

    let request = ApyTrendRequest {
        protocol: "compound".to_string(),
        asset: "USDC".to_string(),
        historical_apy: vec![5.0],
        days: 30,
    };

    let err = service.analyze_apy_trend(&request).await.unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientHistory {
            required: 2,
            actual: 1
        }
    ));
    assert_eq!(err.to_string(), "At least 2 historical APY values required");
}

#[tokio::test]
async fn test_apy_trend_days_defaults_and_rising_series() {
    let dir = tempfile::tempdir().unwrap();
    let service = build_service(&untrained_config(&dir), Metrics::new().unwrap());

    let request: ApyTrendRequest = serde_json::from_value(json!({
        "protocol": "aave",
        "asset": "DAI",
        "historical_apy": [9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
    }))
    .unwrap();
    assert_eq!(request.days, 30);

    let response = service.analyze_apy_trend(&request).await.unwrap();
    // Whole-series mean sits above the recent window mean of 1.0
    assert_eq!(response.trend, TrendLabel::Increasing);
    assert_eq!(response.predicted_apy, 5.27);
    assert_eq!(response.confidence, 0.60);
    assert_eq!(
        response.recommendation,
        "APY is trending upward. Consider increasing position to capture 4.27% higher returns"
    );
}

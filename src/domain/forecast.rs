//! Request/response contracts for the two forecasts and the fixed policies
//! that turn raw predictor output into labels, advice and confidence.

use crate::domain::errors::ForecastError;
use crate::domain::ml::feature_registry::{DEFAULT_APY, mean_or_default};
use crate::domain::ml::{PositionFeatures, PredictorKind, TREND_WINDOW};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Health factor assumed when neither it nor any debt is supplied.
pub const SAFE_HEALTH_FACTOR: f64 = 2.0;
/// Share of collateral value counted towards the health factor.
pub const LIQUIDATION_THRESHOLD: f64 = 0.8;
/// Minimum history length accepted by the trend endpoint.
pub const MIN_TREND_HISTORY: usize = 2;
/// Predicted-vs-recent difference (percentage points) that flips the trend label.
pub const TREND_THRESHOLD: f64 = 0.5;
/// Predicted-vs-current change (percentage points) that triggers actionable advice.
pub const ACTION_THRESHOLD: f64 = 1.0;

pub const RISK_CONFIDENCE_MODEL: f64 = 0.85;
pub const RISK_CONFIDENCE_HEURISTIC: f64 = 0.65;
pub const TREND_CONFIDENCE_MODEL: f64 = 0.75;
pub const TREND_CONFIDENCE_HEURISTIC: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            RiskLevel::Critical
        } else if score >= 0.5 {
            RiskLevel::High
        } else if score >= 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            RiskLevel::Critical => &[
                "Immediate action required: Reduce debt or add collateral",
                "Risk of liquidation is very high",
                "Consider closing positions",
            ],
            RiskLevel::High => &[
                "Consider reducing leverage",
                "Monitor health factor closely",
                "Add collateral to improve safety margin",
            ],
            RiskLevel::Medium => &[
                "Monitor health factor regularly",
                "Consider rebalancing if APY drops",
            ],
            RiskLevel::Low => &["Portfolio is in good health", "Continue monitoring"],
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendLabel {
    /// Labels `predicted` relative to the recent average with a fixed dead band.
    pub fn classify(predicted: f64, recent_avg: f64) -> Self {
        let diff = predicted - recent_avg;
        if diff > TREND_THRESHOLD {
            TrendLabel::Increasing
        } else if diff < -TREND_THRESHOLD {
            TrendLabel::Decreasing
        } else {
            TrendLabel::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Increasing => "increasing",
            TrendLabel::Decreasing => "decreasing",
            TrendLabel::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence reflects provenance (model vs heuristic), not statistical uncertainty.
pub fn risk_confidence(trained: bool) -> f64 {
    if trained {
        RISK_CONFIDENCE_MODEL
    } else {
        RISK_CONFIDENCE_HEURISTIC
    }
}

pub fn trend_confidence(trained: bool, history_len: usize) -> f64 {
    if trained && history_len >= TREND_WINDOW {
        TREND_CONFIDENCE_MODEL
    } else {
        TREND_CONFIDENCE_HEURISTIC
    }
}

pub fn trend_recommendation(trend: TrendLabel, predicted_apy: f64, current_apy: f64) -> String {
    let apy_change = predicted_apy - current_apy;
    match trend {
        TrendLabel::Increasing if apy_change > ACTION_THRESHOLD => format!(
            "APY is trending upward. Consider increasing position to capture {:.2}% higher returns",
            apy_change
        ),
        TrendLabel::Decreasing if apy_change < -ACTION_THRESHOLD => {
            "APY is trending downward. Consider rebalancing to higher-yield protocols".to_string()
        }
        TrendLabel::Stable => {
            "APY expected to remain stable. Current position is optimal".to_string()
        }
        _ => format!("APY trend is {}. Monitor for significant changes", trend),
    }
}

/// Rounds to two decimal places for presentation, halves to even.
///
/// Values too large to scale are returned unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskForecastRequest {
    pub user_address: String,
    pub positions: Vec<Value>,
    #[serde(default)]
    pub health_factor: Option<f64>,
    #[serde(default)]
    pub total_collateral: Option<f64>,
    #[serde(default)]
    pub total_debt: Option<f64>,
}

impl RiskForecastRequest {
    /// Derives the risk feature vector from the raw position totals.
    pub fn to_features(&self) -> PositionFeatures {
        let collateral = self.total_collateral.unwrap_or(0.0);
        let debt = self.total_debt.unwrap_or(0.0);

        let health_factor = match self.health_factor {
            Some(hf) => hf,
            None if debt > 0.0 => (collateral * LIQUIDATION_THRESHOLD) / debt,
            None => SAFE_HEALTH_FACTOR,
        };

        let total = collateral + debt;
        let (collateral_ratio, debt_ratio) = if total > 0.0 {
            (collateral / total, debt / total)
        } else {
            (1.0, 0.0)
        };

        let apy = if self.positions.is_empty() {
            DEFAULT_APY
        } else {
            let apys: Vec<f64> = self
                .positions
                .iter()
                .map(|p| p.get("apy").and_then(Value::as_f64).unwrap_or(DEFAULT_APY))
                .collect();
            mean_or_default(&apys)
        };

        PositionFeatures {
            health_factor: Some(health_factor),
            collateral_ratio: Some(collateral_ratio),
            debt_ratio: Some(debt_ratio),
            apy: Some(apy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskForecastResponse {
    pub liquidation_risk: f64,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

fn default_days() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApyTrendRequest {
    pub protocol: String,
    pub asset: String,
    pub historical_apy: Vec<f64>,
    #[serde(default = "default_days")]
    pub days: i64,
}

impl ApyTrendRequest {
    /// Rejects histories too short to classify a trend.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.historical_apy.len() < MIN_TREND_HISTORY {
            return Err(ForecastError::InsufficientHistory {
                required: MIN_TREND_HISTORY,
                actual: self.historical_apy.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApyTrendResponse {
    pub predicted_apy: f64,
    pub trend: TrendLabel,
    pub confidence: f64,
    pub recommendation: String,
}

/// Labelled rows for an in-process retrain. Feature columns follow the
/// target predictor's layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainingRequest {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainingResponse {
    pub predictor: PredictorKind,
    pub trained: bool,
    pub samples: usize,
}

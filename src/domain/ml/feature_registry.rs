use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Ordered list of risk feature names.
/// This order MUST match exactly with the column order used by `train_ml`.
/// Any change here is a breaking change for persisted models.
pub const RISK_FEATURE_NAMES: &[&str] = &["health_factor", "collateral_ratio", "debt_ratio", "apy"];

/// Trailing window fed to the APY model, oldest first.
pub const TREND_FEATURE_NAMES: &[&str] = &[
    "apy_t-6", "apy_t-5", "apy_t-4", "apy_t-3", "apy_t-2", "apy_t-1", "apy_t",
];

/// Number of trailing APY observations the trend model consumes.
pub const TREND_WINDOW: usize = 7;

pub const DEFAULT_HEALTH_FACTOR: f64 = 1.5;
pub const DEFAULT_COLLATERAL_RATIO: f64 = 0.8;
pub const DEFAULT_DEBT_RATIO: f64 = 0.5;
/// Fallback APY (percent) whenever no observation is available.
pub const DEFAULT_APY: f64 = 5.0;

/// Position state fed to the risk predictor.
///
/// Every field is optional; absent values resolve to the defaults above so
/// that prediction never fails on partial input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionFeatures {
    pub health_factor: Option<f64>,
    pub collateral_ratio: Option<f64>,
    pub debt_ratio: Option<f64>,
    pub apy: Option<f64>,
}

impl PositionFeatures {
    pub fn health_factor(&self) -> f64 {
        self.health_factor.unwrap_or(DEFAULT_HEALTH_FACTOR)
    }

    /// Converts features into the model's input vector, in `RISK_FEATURE_NAMES` order.
    pub fn to_vector(&self) -> Vec<f64> {
        vec![
            self.health_factor(),
            self.collateral_ratio.unwrap_or(DEFAULT_COLLATERAL_RATIO),
            self.debt_ratio.unwrap_or(DEFAULT_DEBT_RATIO),
            self.apy.unwrap_or(DEFAULT_APY),
        ]
    }
}

/// Last `TREND_WINDOW` observations, or `None` when the history is shorter.
pub fn trend_window(history: &[f64]) -> Option<&[f64]> {
    history
        .len()
        .checked_sub(TREND_WINDOW)
        .map(|start| &history[start..])
}

/// Arithmetic mean, `DEFAULT_APY` for an empty series.
///
/// Running mean, so large finite inputs stay finite.
pub fn mean_or_default(values: &[f64]) -> f64 {
    if values.is_empty() {
        return DEFAULT_APY;
    }
    values.iter().mean()
}

//! Per-column standardization fit alongside the regression model.

use crate::domain::errors::ForecastError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Column standard deviations at or below this are treated as constant.
const MIN_SCALE: f64 = 1e-12;

/// Standard scaler: `(x - mean) / std` per column, population std.
///
/// Constant columns keep a scale of 1.0 so they center to zero instead of
/// dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl FeatureScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ForecastError> {
        let width = match rows.first() {
            Some(first) => first.len(),
            None => return Err(ForecastError::EmptyTrainingSet),
        };
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(ForecastError::FeatureWidthMismatch {
                expected: width,
                actual: bad.len(),
            });
        }

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for j in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            let std_dev = column.iter().population_std_dev();
            means.push(column.iter().mean());
            scales.push(if std_dev.is_finite() && std_dev > MIN_SCALE {
                std_dev
            } else {
                1.0
            });
        }

        Ok(Self { means, scales })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Scales a single row. Callers check the width against `n_features` first.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    pub fn transform_rows(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

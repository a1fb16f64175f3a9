//! Versioned model + scaler bundle.
//!
//! The regression model and the scaler it was trained against are persisted
//! and loaded as one value, so a predictor can never pair a new model with a
//! stale scaler.

use super::feature_registry::{RISK_FEATURE_NAMES, TREND_FEATURE_NAMES};
use super::scaler::FeatureScaler;
use crate::domain::errors::ForecastError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;

/// Bump whenever the artifact layout or a feature vector changes shape.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

pub type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Identifies which predictor an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    RiskForecaster,
    ApyTrend,
}

impl PredictorKind {
    pub fn feature_names(&self) -> &'static [&'static str] {
        match self {
            PredictorKind::RiskForecaster => RISK_FEATURE_NAMES,
            PredictorKind::ApyTrend => TREND_FEATURE_NAMES,
        }
    }

    /// Well-known file name inside the models directory.
    pub fn artifact_file_name(&self) -> &'static str {
        match self {
            PredictorKind::RiskForecaster => "risk_forecaster.json",
            PredictorKind::ApyTrend => "apy_predictor.json",
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PredictorKind::RiskForecaster => "risk",
            PredictorKind::ApyTrend => "apy_trend",
        }
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub kind: PredictorKind,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub scaler: FeatureScaler,
    pub model: ForestModel,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("schema_version", &self.schema_version)
            .field("kind", &self.kind)
            .field("feature_names", &self.feature_names)
            .field("trained_at", &self.trained_at)
            .field("training_samples", &self.training_samples)
            .finish_non_exhaustive()
    }
}

impl ModelArtifact {
    /// Checks that this artifact can serve `expected` without a shape mismatch.
    pub fn validate(&self, expected: PredictorKind) -> Result<(), ForecastError> {
        if self.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(ForecastError::SchemaVersion {
                expected: ARTIFACT_SCHEMA_VERSION,
                found: self.schema_version,
            });
        }
        if self.kind != expected {
            return Err(ForecastError::KindMismatch {
                expected,
                found: self.kind,
            });
        }
        let names = expected.feature_names();
        if self.feature_names.len() != names.len()
            || self.feature_names.iter().zip(names).any(|(a, b)| a != b)
            || self.scaler.n_features() != names.len()
        {
            return Err(ForecastError::FeatureLayout { kind: expected });
        }
        Ok(())
    }

    /// Scales one raw feature row and runs it through the forest.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ForecastError> {
        if row.len() != self.scaler.n_features() {
            return Err(ForecastError::FeatureWidthMismatch {
                expected: self.scaler.n_features(),
                actual: row.len(),
            });
        }

        let scaled = self.scaler.transform(row);
        let input_matrix = DenseMatrix::from_2d_vec(&vec![scaled]).map_err(|e| {
            ForecastError::Inference {
                reason: format!("Matrix creation failed: {}", e),
            }
        })?;

        let predictions = self
            .model
            .predict(&input_matrix)
            .map_err(|e| ForecastError::Inference {
                reason: format!("Prediction failed: {}", e),
            })?;

        predictions
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Inference {
                reason: "No prediction returned".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_file_names_are_distinct() {
        assert_ne!(
            PredictorKind::RiskForecaster.artifact_file_name(),
            PredictorKind::ApyTrend.artifact_file_name()
        );
        assert_eq!(PredictorKind::RiskForecaster.feature_names().len(), 4);
        assert_eq!(PredictorKind::ApyTrend.feature_names().len(), 7);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&PredictorKind::ApyTrend).unwrap();
        assert_eq!(json, "\"apy_trend\"");
        assert_eq!(PredictorKind::RiskForecaster.to_string(), "risk");
    }
}

//! Fitting and evaluating the paired scaler + random forest.

use crate::domain::errors::ForecastError;
use crate::domain::ml::{ARTIFACT_SCHEMA_VERSION, FeatureScaler, ModelArtifact, PredictorKind};
use chrono::Utc;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// Random forest hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
}

impl ForestParams {
    pub fn risk_default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
        }
    }

    pub fn trend_default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_split: 2,
        }
    }
}

/// Fits a fresh artifact for `kind`. Scaler first, then the forest on scaled rows.
pub fn fit_artifact(
    kind: PredictorKind,
    x: &[Vec<f64>],
    y: &[f64],
    params: ForestParams,
) -> Result<ModelArtifact, ForecastError> {
    validate_training_set(kind, x, y)?;

    let scaler = FeatureScaler::fit(x)?;
    let scaled = scaler.transform_rows(x);
    let x_matrix = DenseMatrix::from_2d_vec(&scaled).map_err(|e| ForecastError::ModelFit {
        reason: format!("Matrix error: {}", e),
    })?;

    let rf_params = RandomForestRegressorParameters::default()
        .with_n_trees(params.n_trees)
        .with_max_depth(params.max_depth)
        .with_min_samples_split(params.min_samples_split);

    let labels = y.to_vec();
    let model = RandomForestRegressor::fit(&x_matrix, &labels, rf_params).map_err(|e| {
        ForecastError::ModelFit {
            reason: format!("Training error: {}", e),
        }
    })?;

    Ok(ModelArtifact {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        kind,
        feature_names: kind.feature_names().iter().map(|s| s.to_string()).collect(),
        trained_at: Utc::now(),
        training_samples: x.len(),
        scaler,
        model,
    })
}

fn validate_training_set(
    kind: PredictorKind,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<(), ForecastError> {
    if x.is_empty() {
        return Err(ForecastError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ForecastError::LabelCountMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }

    let width = kind.feature_names().len();
    for (row_idx, (row, label)) in x.iter().zip(y).enumerate() {
        if row.len() != width {
            return Err(ForecastError::FeatureWidthMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        if !label.is_finite() || row.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFiniteInput { row: row_idx });
        }
    }
    Ok(())
}

/// Out-of-sample regression quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionReport {
    pub samples: usize,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

/// Scores `artifact` against a labelled hold-out set.
pub fn evaluate(
    artifact: &ModelArtifact,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<RegressionReport, ForecastError> {
    if x.is_empty() {
        return Err(ForecastError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ForecastError::LabelCountMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }

    let predictions = x
        .iter()
        .map(|row| artifact.predict_row(row))
        .collect::<Result<Vec<f64>, _>>()?;

    let n = predictions.len() as f64;
    let sq_err: f64 = predictions
        .iter()
        .zip(y)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    let mae = predictions
        .iter()
        .zip(y)
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let var_y = y.iter().map(|t| (t - mean_y).powi(2)).sum::<f64>() / n;
    let r2 = if var_y > 0.0 {
        1.0 - (sq_err / n) / var_y
    } else {
        0.0
    };

    Ok(RegressionReport {
        samples: predictions.len(),
        rmse: (sq_err / n).sqrt(),
        mae,
        r2,
    })
}

use crate::domain::ml::PredictorKind;
use thiserror::Error;

/// Errors raised around the forecasting core.
///
/// `predict` paths never produce these; they come from request validation,
/// training, and artifact loading.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("At least {required} historical APY values required")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Training set has {rows} rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    FeatureWidthMismatch { expected: usize, actual: usize },

    #[error("Training data contains a non-finite value in row {row}")]
    NonFiniteInput { row: usize },

    #[error("Model fitting failed: {reason}")]
    ModelFit { reason: String },

    #[error("Model inference failed: {reason}")]
    Inference { reason: String },

    #[error("Unsupported artifact schema: expected v{expected}, got v{found}")]
    SchemaVersion { expected: u32, found: u32 },

    #[error("Artifact kind mismatch: expected {expected}, got {found}")]
    KindMismatch {
        expected: PredictorKind,
        found: PredictorKind,
    },

    #[error("Artifact feature layout does not match the {kind} predictor")]
    FeatureLayout { kind: PredictorKind },

    #[error("Model store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ForecastError {
    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientHistory { .. }
                | ForecastError::EmptyTrainingSet
                | ForecastError::LabelCountMismatch { .. }
                | ForecastError::FeatureWidthMismatch { .. }
                | ForecastError::NonFiniteInput { .. }
        )
    }
}

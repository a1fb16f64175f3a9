use super::predictor::{ModelState, PredictionMode, Predictor};
use super::training::ForestParams;
use crate::domain::ml::{PositionFeatures, PredictorKind};
use tracing::{debug, warn};

/// Liquidation-risk predictor.
///
/// Trained: scaled `[health_factor, collateral_ratio, debt_ratio, apy]`
/// through the forest, clamped to [0, 1]. Untrained: a health-factor ladder.
#[derive(Debug)]
pub struct RiskPredictor {
    state: ModelState,
    params: ForestParams,
}

impl Default for RiskPredictor {
    fn default() -> Self {
        Self::new(ForestParams::risk_default())
    }
}

impl RiskPredictor {
    pub fn new(params: ForestParams) -> Self {
        Self {
            state: ModelState::Untrained,
            params,
        }
    }

    /// Heuristic fallback. Only the health factor is considered.
    pub fn heuristic(health_factor: f64) -> f64 {
        if health_factor < 1.1 {
            0.9
        } else if health_factor < 1.3 {
            0.6
        } else if health_factor < 1.5 {
            0.3
        } else {
            0.1
        }
    }

    pub fn predict_with_mode(&self, features: &PositionFeatures) -> (f64, PredictionMode) {
        if let Some(artifact) = self.state.artifact() {
            match artifact.predict_row(&features.to_vector()) {
                Ok(risk) if risk.is_finite() => {
                    debug!("Risk model prediction: {:.4}", risk);
                    return (risk.clamp(0.0, 1.0), PredictionMode::Model);
                }
                Ok(risk) => warn!("Risk model returned non-finite value {}", risk),
                Err(e) => warn!("Risk model inference failed: {}", e),
            }
        }

        (
            Self::heuristic(features.health_factor()),
            PredictionMode::Heuristic,
        )
    }
}

impl Predictor for RiskPredictor {
    type Input = PositionFeatures;
    type Output = f64;

    fn kind(&self) -> PredictorKind {
        PredictorKind::RiskForecaster
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }

    fn params(&self) -> ForestParams {
        self.params
    }

    fn predict(&self, features: &PositionFeatures) -> f64 {
        self.predict_with_mode(features).0
    }
}

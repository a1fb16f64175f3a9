use super::predictor::{ModelState, PredictionMode, Predictor};
use super::training::ForestParams;
use crate::domain::forecast::{MIN_TREND_HISTORY, TrendLabel};
use crate::domain::ml::PredictorKind;
use crate::domain::ml::feature_registry::{mean_or_default, trend_window};
use tracing::{debug, warn};

/// Next-period APY predictor.
///
/// The model needs a full trailing window; anything shorter, or an
/// untrained predictor, falls back to the history mean.
#[derive(Debug)]
pub struct TrendPredictor {
    state: ModelState,
    params: ForestParams,
}

impl Default for TrendPredictor {
    fn default() -> Self {
        Self::new(ForestParams::trend_default())
    }
}

impl TrendPredictor {
    pub fn new(params: ForestParams) -> Self {
        Self {
            state: ModelState::Untrained,
            params,
        }
    }

    pub fn predict_with_mode(&self, history: &[f64]) -> (f64, PredictionMode) {
        if let (Some(artifact), Some(window)) = (self.state.artifact(), trend_window(history)) {
            match artifact.predict_row(window) {
                Ok(apy) if apy.is_finite() => {
                    debug!("APY model prediction: {:.4}", apy);
                    // APY cannot be negative
                    return (apy.max(0.0), PredictionMode::Model);
                }
                Ok(apy) => warn!("APY model returned non-finite value {}", apy),
                Err(e) => warn!("APY model inference failed: {}", e),
            }
        }

        (mean_or_default(history), PredictionMode::Heuristic)
    }

    /// Classifies where the next value sits relative to the recent average.
    /// Histories shorter than two points are `Stable` by definition.
    pub fn predict_trend(&self, history: &[f64]) -> TrendLabel {
        if history.len() < MIN_TREND_HISTORY {
            return TrendLabel::Stable;
        }

        let predicted = self.predict(history);
        let recent = trend_window(history).unwrap_or(history);
        TrendLabel::classify(predicted, mean_or_default(recent))
    }
}

impl Predictor for TrendPredictor {
    type Input = [f64];
    type Output = f64;

    fn kind(&self) -> PredictorKind {
        PredictorKind::ApyTrend
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

    fn predict(&self, history: &[f64]) -> f64 {
        self.predict_with_mode(history).0
    }
}

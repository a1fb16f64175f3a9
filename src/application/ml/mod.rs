//! Dual-mode prediction engine: random-forest inference when a trained
//! artifact is present, deterministic heuristics otherwise.

pub mod predictor;
pub mod risk_predictor;
pub mod synthetic;
pub mod training;
pub mod trend_predictor;

pub use predictor::{ModelState, PredictionMode, Predictor};
pub use risk_predictor::RiskPredictor;
pub use training::{ForestParams, RegressionReport};
pub use trend_predictor::TrendPredictor;

use super::training::{ForestParams, fit_artifact};
use crate::domain::errors::ForecastError;
use crate::domain::ml::{ModelArtifact, PredictorKind};
use crate::domain::ports::ModelStore;
use tracing::{info, warn};

/// Which computation path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMode {
    Model,
    Heuristic,
}

impl PredictionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMode::Model => "model",
            PredictionMode::Heuristic => "heuristic",
        }
    }
}

/// Untrained until a successful train or load; never goes back.
#[derive(Debug, Default)]
pub enum ModelState {
    #[default]
    Untrained,
    Trained(Box<ModelArtifact>),
}

impl ModelState {
    pub fn is_trained(&self) -> bool {
        matches!(self, ModelState::Trained(_))
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        match self {
            ModelState::Trained(artifact) => Some(artifact),
            ModelState::Untrained => None,
        }
    }

    /// Validates and swaps in a new artifact. On error the state is untouched.
    pub fn install(
        &mut self,
        kind: PredictorKind,
        artifact: ModelArtifact,
    ) -> Result<(), ForecastError> {
        artifact.validate(kind)?;
        *self = ModelState::Trained(Box::new(artifact));
        Ok(())
    }

    pub fn train(
        &mut self,
        kind: PredictorKind,
        params: ForestParams,
        x: &[Vec<f64>],
        y: &[f64],
    ) -> Result<(), ForecastError> {
        let artifact = fit_artifact(kind, x, y, params)?;
        info!(
            "Trained {} model on {} samples ({} trees, depth {})",
            kind,
            x.len(),
            params.n_trees,
            params.max_depth
        );
        self.install(kind, artifact)
    }
}

/// Capability set shared by the risk and APY-trend predictors.
///
/// `predict` is total: an untrained predictor answers with its heuristic.
pub trait Predictor: Send + Sync {
    type Input: ?Sized;
    type Output;

    fn kind(&self) -> PredictorKind;

    fn state(&self) -> &ModelState;

    fn state_mut(&mut self) -> &mut ModelState;

    fn params(&self) -> ForestParams;

    fn predict(&self, input: &Self::Input) -> Self::Output;

    fn is_trained(&self) -> bool {
        self.state().is_trained()
    }

    /// Fits scaler and model on `x`/`y`; the predictor only flips to trained on success.
    fn train(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ForecastError> {
        let (kind, params) = (self.kind(), self.params());
        self.state_mut().train(kind, params, x, y)
    }

    fn install(&mut self, artifact: ModelArtifact) -> Result<(), ForecastError> {
        let kind = self.kind();
        self.state_mut().install(kind, artifact)
    }

    /// Loads the persisted artifact. Returns `false` when none exists.
    fn load(&mut self, store: &dyn ModelStore) -> Result<bool, ForecastError> {
        match store.load(self.kind())? {
            Some(artifact) => {
                self.install(artifact)?;
                info!("Loaded {} model artifact", self.kind());
                Ok(true)
            }
            None => {
                warn!(
                    "No {} model artifact found. Predictor will use its heuristic.",
                    self.kind()
                );
                Ok(false)
            }
        }
    }

    /// Persists the current artifact. Untrained predictors write nothing.
    fn save(&self, store: &dyn ModelStore) -> Result<bool, ForecastError> {
        match self.state().artifact() {
            Some(artifact) => {
                store.save(artifact)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

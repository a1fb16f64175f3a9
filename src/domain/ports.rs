use crate::domain::ml::{ModelArtifact, PredictorKind};
use anyhow::Result;

/// Persistent home for trained model artifacts.
///
/// A missing artifact is `Ok(None)`, not an error.
pub trait ModelStore: Send + Sync {
    fn load(&self, kind: PredictorKind) -> Result<Option<ModelArtifact>>;
    fn save(&self, artifact: &ModelArtifact) -> Result<()>;
}

//! Feature engineering and the persisted model artifact.

pub mod artifact;
pub mod feature_registry;
pub mod scaler;

pub use artifact::{ARTIFACT_SCHEMA_VERSION, ForestModel, ModelArtifact, PredictorKind};
pub use feature_registry::{PositionFeatures, TREND_WINDOW};
pub use scaler::FeatureScaler;

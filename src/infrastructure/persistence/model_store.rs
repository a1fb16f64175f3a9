use crate::domain::ml::{ModelArtifact, PredictorKind};
use crate::domain::ports::ModelStore;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stores one JSON artifact per predictor inside a model directory.
///
/// Files are `risk_forecaster.json` and `apy_predictor.json`.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: PredictorKind) -> PathBuf {
        self.dir.join(kind.artifact_file_name())
    }
}

impl ModelStore for FileModelStore {
    fn load(&self, kind: PredictorKind) -> Result<Option<ModelArtifact>> {
        let path = self.path_for(kind);
        if !path.exists() {
            debug!("No {} artifact at {:?}", kind, path);
            return Ok(None);
        }

        let file =
            File::open(&path).with_context(|| format!("Failed to open model file {:?}", path))?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse model JSON {:?}", path))?;

        info!(
            "Loaded {} model from {:?} ({} samples, trained {})",
            kind, path, artifact.training_samples, artifact.trained_at
        );
        Ok(Some(artifact))
    }

    fn save(&self, artifact: &ModelArtifact) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create model directory {:?}", self.dir))?;
        }

        let path = self.path_for(artifact.kind);

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)
                .with_context(|| format!("Failed to create temp model file {:?}", temp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, artifact).context("Failed to serialize model")?;
            writer.flush().context("Failed to flush model file")?;
        }
        fs::rename(&temp_path, &path).context("Failed to rename model file")?;

        info!("Saved {} model to {:?}", artifact.kind, path);
        Ok(())
    }
}

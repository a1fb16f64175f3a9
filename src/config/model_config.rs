//! Model configuration parsing from environment variables.
//!
//! Where artifacts live and how the random forests are shaped.

use crate::application::ml::ForestParams;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub model_dir: PathBuf,
    pub risk_params: ForestParams,
    pub trend_params: ForestParams,
    /// Write trained artifacts back to `model_dir` on shutdown
    pub persist_on_shutdown: bool,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            risk_params: ForestParams::risk_default(),
            trend_params: ForestParams::trend_default(),
            persist_on_shutdown: false,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let risk_default = ForestParams::risk_default();
        let trend_default = ForestParams::trend_default();
        let min_samples_split =
            Self::parse_usize("MODEL_MIN_SAMPLES_SPLIT", risk_default.min_samples_split)?;

        let risk_params = ForestParams {
            n_trees: Self::parse_usize("RISK_MODEL_TREES", risk_default.n_trees)?,
            max_depth: Self::parse_u16("RISK_MODEL_MAX_DEPTH", risk_default.max_depth)?,
            min_samples_split,
        };
        let trend_params = ForestParams {
            n_trees: Self::parse_usize("TREND_MODEL_TREES", trend_default.n_trees)?,
            max_depth: Self::parse_u16("TREND_MODEL_MAX_DEPTH", trend_default.max_depth)?,
            min_samples_split,
        };

        if risk_params.n_trees == 0 || trend_params.n_trees == 0 {
            anyhow::bail!("Model tree counts must be at least 1");
        }

        Ok(Self {
            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            risk_params,
            trend_params,
            persist_on_shutdown: Self::parse_bool("PERSIST_ON_SHUTDOWN", false),
        })
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u16(key: &str, default: u16) -> Result<u16> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u16>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<bool>()
            .unwrap_or(default)
    }
}

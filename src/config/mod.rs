//! Configuration module for the forecast service.
//!
//! Structured configuration loading from environment variables,
//! organized by concern: Model, Server, and Observability.

mod model_config;
mod observability_config;
mod server_config;

pub use model_config::ModelEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use server_config::ServerEnvConfig;

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelEnvConfig,
    pub server: ServerEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let model = ModelEnvConfig::from_env().context("Failed to load model config")?;
        let server = ServerEnvConfig::from_env().context("Failed to load server config")?;
        let observability =
            ObservabilityEnvConfig::from_env().context("Failed to load observability config")?;

        Ok(Self {
            model,
            server,
            observability,
        })
    }
}

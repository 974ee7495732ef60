//! Configuration loading for the cashflow CLI

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use cashflow_rl::{LearningParams, OptimizerOptions, RetentionPolicy};

pub const CONFIG_FILE_NAME: &str = "cashflow.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub learning: LearningConfig,
    pub optimizer: OptimizerConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub exploration_rate: f64,
    pub exploration_decay: f64,
    pub seed: Option<u64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        let params = LearningParams::default();
        Self {
            learning_rate: params.learning_rate,
            discount_factor: params.discount_factor,
            exploration_rate: params.exploration_rate,
            exploration_decay: OptimizerOptions::default().exploration_decay,
            seed: None,
        }
    }
}

impl LearningConfig {
    pub fn params(&self) -> LearningParams {
        LearningParams {
            learning_rate: self.learning_rate,
            discount_factor: self.discount_factor,
            exploration_rate: self.exploration_rate,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub iterations: i64,
    pub retention: RetentionPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            retention: RetentionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub snapshot_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/financial_data.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from an explicit file (if any) plus `CASHFLOW__` environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            tracing::debug!("Loading config from: {:?}", path);
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        } else {
            tracing::debug!("No config file found, using defaults");
        }

        builder = builder.add_source(
            Environment::with_prefix("CASHFLOW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check the learning section
    pub fn validate(&self) -> Result<()> {
        self.learning
            .params()
            .validate()
            .context("Invalid [learning] configuration")?;

        let decay = self.learning.exploration_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            bail!("Invalid [learning] configuration: exploration_decay must be in (0, 1], got {decay}");
        }
        Ok(())
    }

    /// Check in order: CASHFLOW_CONFIG env, ./cashflow.toml, ~/.config/cashflow/cashflow.toml
    pub fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CASHFLOW_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("cashflow").join(CONFIG_FILE_NAME);
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    pub fn optimizer_options(&self) -> OptimizerOptions {
        OptimizerOptions {
            exploration_decay: self.learning.exploration_decay,
            retention: self.optimizer.retention,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

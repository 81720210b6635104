use serde::Deserialize;
use std::path::Path;

use anyhow::{bail, Context};

/// Environment variable naming the config file; defaults to `config.yaml`.
pub const CONFIG_ENV: &str = "GOALCAST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Report errors with 400/500 instead of 200. Existing clients expect 200.
    #[serde(default)]
    pub strict_status_codes: bool,
    /// Largest accepted `/predict` body; unlimited when unset.
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            strict_status_codes: false,
            max_body_bytes: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ModelConfig {
    pub path: String,
    /// Session input fed with the feature matrix; the first input if unset.
    #[serde(default)]
    pub input_name: Option<String>,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    /// Columns of the feature matrix, in the order the model was exported with.
    pub features: Vec<FeatureColumn>,
}

/// One column of the model input. With `categories` set the column is
/// one-hot encoded into `categories.len()` slots.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureColumn {
    pub column: String,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

impl FeatureColumn {
    pub fn numeric(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            categories: None,
        }
    }

    pub fn categorical(column: impl Into<String>, categories: &[&str]) -> Self {
        Self {
            column: column.into(),
            categories: Some(categories.iter().map(|c| c.to_string()).collect()),
        }
    }

    /// Number of tensor slots this column occupies.
    pub fn width(&self) -> usize {
        self.categories.as_ref().map_or(1, Vec::len)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    5000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_intra_threads() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content).context("invalid config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Loads from `$GOALCAST_CONFIG`, or `config.yaml` in the working directory.
    pub fn from_env() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.model.features.is_empty() {
            bail!("model.features must list at least one column");
        }
        for feature in &self.model.features {
            if feature.width() == 0 {
                bail!("categorical column '{}' has no categories", feature.column);
            }
        }
        Ok(())
    }
}

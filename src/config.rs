use crate::error::RankevalError;
use crate::eval::{EvalOptions, NonFinitePolicy};
use crate::metrics::MetricKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    pub metrics: Vec<MetricConfig>,
}

/// Evaluation-wide settings
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    /// Score query groups in parallel (results are identical to sequential)
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub non_finite: NonFinitePolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            non_finite: NonFinitePolicy::default(),
            log_level: default_log_level(),
        }
    }
}

/// One configured metric
#[derive(Debug, Clone, Deserialize)]
pub struct MetricConfig {
    /// Metric kind: "mse" or "rmse"
    pub kind: String,
    /// Display name; defaults to the kind's standard name
    #[serde(default)]
    pub name: Option<String>,
    /// Top-k documents by predicted score; omitted means no truncation
    #[serde(default)]
    pub cutoff: Option<i64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl MetricConfig {
    fn build(&self) -> crate::error::Result<MetricKind> {
        let cutoff = match self.cutoff {
            None => None,
            Some(k) if k <= 0 => {
                return Err(RankevalError::InvalidConfiguration(format!(
                    "metric {}: cutoff must be a positive integer, got {}",
                    self.kind, k
                )))
            }
            Some(k) => Some(usize::try_from(k).map_err(|_| {
                RankevalError::InvalidConfiguration(format!(
                    "metric {}: cutoff {} out of range",
                    self.kind, k
                ))
            })?),
        };
        MetricKind::build(&self.kind, self.name.as_deref(), cutoff)
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RANKEVAL_CONFIG environment variable
    /// 2. ./rankeval.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("RANKEVAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("rankeval.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse rankeval config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Every metric is built once here so a bad cutoff or kind fails at load time.
    pub fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(RankevalError::InvalidConfiguration(
                "at least one [[metrics]] entry is required".to_string(),
            )
            .into());
        }
        self.build_metrics()?;
        Ok(())
    }

    /// Instantiate the configured metrics, in file order
    pub fn build_metrics(&self) -> crate::error::Result<Vec<MetricKind>> {
        self.metrics.iter().map(MetricConfig::build).collect()
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            parallel: self.evaluation.parallel,
            non_finite: self.evaluation.non_finite,
        }
    }
}

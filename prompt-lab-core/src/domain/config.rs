use config::{Config as ConfigLoader, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::error::{LabError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";
pub const ENV_PREFIX: &str = "PROMPT_LAB";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ===== Model Settings =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct ModelSettings {
    #[validate(length(min = 1, max = 255))]
    #[serde(default = "default_model_name")]
    pub name: String,
    #[validate(range(min = 0.0, max = 2.0))]
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub mock_mode: bool,
    #[validate(range(max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_secs")]
    pub rate_limit_backoff_secs: u64,
    #[validate(length(min = 1))]
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            temperature: default_temperature(),
            mock_mode: false,
            max_retries: default_max_retries(),
            rate_limit_backoff_secs: default_backoff_secs(),
            api_base: default_api_base(),
            api_key: None,
        }
    }
}

fn default_model_name() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    60
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

// ===== Task Settings =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub strategies: Option<Vec<String>>,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strategies: None,
        }
    }
}

fn default_true() -> bool {
    true
}

// ===== Evaluation Settings =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct EvaluationSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub save_results: bool,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            save_results: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

// ===== Lab Configuration =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct LabConfig {
    #[validate(nested)]
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub tasks: HashMap<String, TaskSettings>,
    #[validate(nested)]
    #[serde(default)]
    pub evaluation: EvaluationSettings,
}

impl LabConfig {
    /// Load configuration from `path` (optional), then `PROMPT_LAB__*`
    /// environment variables, then the given dotted-key overrides.
    ///
    /// Fails with `LabError::Configuration` when the model is live and no
    /// API key can be found.
    pub fn load(path: impl AsRef<Path>, overrides: &[(String, String)]) -> Result<Self> {
        let mut builder = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, value) in overrides {
            tracing::info!(key = %key, value = %value, "Override applied");
            builder = builder.set_override(key.as_str(), value.as_str())?;
        }

        let mut config: LabConfig = builder.build()?.try_deserialize()?;
        if config.model.api_key.is_none() {
            config.model.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        config.check()?;
        Ok(config)
    }

    /// Validate field ranges and startup requirements.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if !self.model.mock_mode && self.model.api_key.is_none() {
            return Err(LabError::Configuration(format!(
                "{API_KEY_ENV} environment variable not found"
            )));
        }
        Ok(())
    }

    /// Settings for a task key, falling back to defaults when unlisted.
    pub fn task(&self, key: &str) -> TaskSettings {
        self.tasks.get(key).cloned().unwrap_or_default()
    }

    /// Apply one dotted-key override, e.g. `("model.temperature", "0.3")`,
    /// on top of the current values. The API key is carried over as is.
    pub fn override_setting(&self, key: &str, value: &str) -> Result<Self> {
        let mut updated: LabConfig = ConfigLoader::builder()
            .add_source(ConfigLoader::try_from(self)?)
            .set_override(key, value)?
            .build()?
            .try_deserialize()?;
        updated.model.api_key = self.model.api_key.clone();
        updated.validate()?;

        tracing::info!(key = %key, value = %value, "Setting overridden");
        Ok(updated)
    }

    /// Configuration for offline runs against the stub client.
    pub fn mock() -> Self {
        Self {
            model: ModelSettings {
                mock_mode: true,
                ..ModelSettings::default()
            },
            ..Self::default()
        }
    }
}

/// Parse `key=value` pairs into dotted-key overrides.
pub fn parse_override(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(LabError::Configuration(format!(
            "invalid override '{raw}', expected key=value"
        ))),
    }
}

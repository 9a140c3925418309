use crate::advice::AdviceSettings;
use crate::estimation::forest::DEFAULT_TREE_COUNT;
use crate::estimation::training::{DEFAULT_SEED, DEFAULT_TRAINING_SAMPLES, MAX_TRAINING_SAMPLES};
use crate::estimation::{ArtifactPaths, EstimatorConfig, TrainingParams};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_ARTIFACT_DIR: &str = "models";
pub const DEFAULT_ADVICE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_ADVICE_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_ADVICE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_ADVICE_MAX_TOKENS: u32 = 200;
pub const DEFAULT_ADVICE_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub model: Option<ModelSection>,
    #[serde(default)]
    pub advice: Option<AdviceSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ModelSection {
    pub regressor_path: Option<PathBuf>,
    pub encoder_path: Option<PathBuf>,
    pub scaler_path: Option<PathBuf>,
    /// Number of trees in the forest (default: 100)
    pub n_estimators: Option<usize>,
    pub seed: Option<u64>,
    /// Sample count used when a training request omits one (default: 500)
    pub default_samples: Option<usize>,
    /// Upper bound on a training request's sample count (default: 20000)
    pub max_samples: Option<usize>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdviceSection {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the API key (default: OPENAI_API_KEY)
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    /// Artifact locations; unset or empty paths fall back to `models/`.
    pub fn artifact_paths(&self) -> ArtifactPaths {
        let defaults = ArtifactPaths::in_dir(DEFAULT_ARTIFACT_DIR);
        let section = self.model.clone().unwrap_or_default();
        ArtifactPaths {
            regressor: non_empty(section.regressor_path).unwrap_or(defaults.regressor),
            encoder: non_empty(section.encoder_path).unwrap_or(defaults.encoder),
            scaler: non_empty(section.scaler_path).unwrap_or(defaults.scaler),
        }
    }

    pub fn estimator_config(&self) -> EstimatorConfig {
        let section = self.model.clone().unwrap_or_default();
        EstimatorConfig {
            artifacts: self.artifact_paths(),
            training: TrainingParams {
                n_trees: section.n_estimators.unwrap_or(DEFAULT_TREE_COUNT),
                seed: section.seed.unwrap_or(DEFAULT_SEED),
            },
            default_samples: section.default_samples.unwrap_or(DEFAULT_TRAINING_SAMPLES),
            max_samples: section.max_samples.unwrap_or(MAX_TRAINING_SAMPLES),
        }
    }

    /// Name of the environment variable that carries the advice API key.
    pub fn api_key_env(&self) -> &str {
        self.advice
            .as_ref()
            .and_then(|a| a.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Advice settings with `api_key` resolved by the caller.
    pub fn advice_settings(&self, api_key: Option<String>) -> AdviceSettings {
        let section = self.advice.clone().unwrap_or_default();
        AdviceSettings {
            endpoint: section
                .endpoint
                .unwrap_or_else(|| DEFAULT_ADVICE_ENDPOINT.to_string()),
            model: section
                .model
                .unwrap_or_else(|| DEFAULT_ADVICE_MODEL.to_string()),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout: Duration::from_secs(
                section.timeout_secs.unwrap_or(DEFAULT_ADVICE_TIMEOUT_SECS),
            ),
            max_tokens: section.max_tokens.unwrap_or(DEFAULT_ADVICE_MAX_TOKENS),
            temperature: section.temperature.unwrap_or(DEFAULT_ADVICE_TEMPERATURE),
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_temp_config(label: &str, contents: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = std::env::temp_dir().join(format!("ecopulse-config-{label}-{unique}.toml"));
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn default_config_sets_artifact_paths() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_default()?;
        let paths = config.artifact_paths();
        assert!(paths.regressor.ends_with("eco_points_regressor.json"));
        assert_eq!(config.estimator_config().training.n_trees, DEFAULT_TREE_COUNT);
        Ok(())
    }

    #[test]
    fn minimal_config_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config(
            "minimal",
            r#"
[app]
name = "ecopulse-scoring"

[logging]
level = "info"
"#,
        )?;

        let config = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        assert_eq!(config.artifact_paths(), ArtifactPaths::in_dir(DEFAULT_ARTIFACT_DIR));
        assert_eq!(config.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(config.api_key_env(), DEFAULT_API_KEY_ENV);
        assert_eq!(config.estimator_config().max_samples, MAX_TRAINING_SAMPLES);

        let advice = config.advice_settings(None);
        assert_eq!(advice.timeout, Duration::from_secs(60));
        assert_eq!(advice.max_tokens, 200);
        assert_eq!(advice.model, DEFAULT_ADVICE_MODEL);
        Ok(())
    }

    #[test]
    fn empty_artifact_path_is_treated_as_missing() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config(
            "empty-path",
            r#"
[app]
name = "ecopulse-scoring"

[logging]
level = "debug"

[model]
regressor_path = ""
scaler_path = "/var/lib/ecopulse/scaler.json"
n_estimators = 25
max_samples = 1000
"#,
        )?;

        let config = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        let paths = config.artifact_paths();
        assert_eq!(
            paths.regressor,
            ArtifactPaths::in_dir(DEFAULT_ARTIFACT_DIR).regressor
        );
        assert_eq!(paths.scaler, PathBuf::from("/var/lib/ecopulse/scaler.json"));
        assert_eq!(config.estimator_config().training.n_trees, 25);
        assert_eq!(config.estimator_config().max_samples, 1000);
        Ok(())
    }

    #[test]
    fn blank_api_key_counts_as_absent() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_default()?;
        assert!(config.advice_settings(Some("   ".to_string())).api_key.is_none());
        assert_eq!(
            config.advice_settings(Some("sk-test".to_string())).api_key.as_deref(),
            Some("sk-test")
        );
        Ok(())
    }

    #[test]
    fn missing_config_file_returns_read_error() {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("ecopulse-config-missing-{unique}.toml"));

        let result = load_from_path(&path);

        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn invalid_toml_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let path = write_temp_config("invalid", "not = [valid")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        Ok(())
    }
}

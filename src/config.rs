//! Runtime configuration for model-serve.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional JSON config file, then command-line flags / environment variables.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AUTH_TOKEN must be set to a non-empty value")]
    MissingAuthToken,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "model-serve", about = "HTTP inference server for a pre-trained model")]
pub struct Cli {
    /// Optional path to a JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HTTP listen address.
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen: Option<String>,

    /// Path to the serialized model artifact.
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Input width for backends that cannot report it themselves (ONNX).
    #[arg(long, env = "MODEL_INPUT_FEATURES")]
    pub input_features: Option<usize>,

    /// Shared bearer secret expected on `/predict`.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log line format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Model configuration.
    pub model: ModelConfig,

    /// Authentication configuration.
    pub auth: AuthConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:5000").
    pub listen: String,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Model artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the model artifact (`.json`, or `.onnx` with the `onnx` feature).
    pub model_path: PathBuf,

    /// Number of input features, required for ONNX graphs.
    pub input_features: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            input_features: None,
        }
    }
}

/// Bearer token settings. No default secret exists; an empty token fails validation.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub token: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Build the effective configuration from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(path) = &cli.model_path {
            self.model.model_path = path.clone();
        }
        if let Some(n) = cli.input_features {
            self.model.input_features = Some(n);
        }
        if let Some(token) = &cli.auth_token {
            self.auth.token = token.clone();
        }
    }

    /// Reject configurations the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token.trim().is_empty() {
            return Err(ConfigError::MissingAuthToken);
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.model.input_features == Some(0) {
            return Err(ConfigError::Invalid(
                "model.input_features must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

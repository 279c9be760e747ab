//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Configuration for talking to one panel.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct PanelConfig {
    /// Base URL of the panel, e.g. `http://host:5000`.
    #[builder(default = "default_base_url()")]
    pub base_url: String,

    /// Delay before re-querying running state after start/stop.
    #[builder(default = "3000")]
    pub settle_delay_ms: u64,

    /// TCP connect timeout for requests.
    #[builder(default = "10")]
    pub connect_timeout_secs: u64,

    /// Shortcut entries shown at the root of the file tree.
    #[builder(default = "default_shortcuts()")]
    pub shortcuts: Vec<String>,

    /// Destination used when an upload does not name one.
    #[builder(default = "\"plugins\".to_string()")]
    pub default_upload_destination: String,

    /// Read size for streamed upload bodies.
    #[builder(default = "64 * 1024")]
    pub upload_chunk_size: usize,

    /// Path of the push channel endpoint.
    #[builder(default = "\"/socket.io/\".to_string()")]
    pub socket_path: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_shortcuts() -> Vec<String> {
    vec!["minecraft".to_string(), "backup".to_string()]
}

fn validate_base_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("Base URL cannot be empty".to_string());
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("Base URL must start with http:// or https:// (got {url})"));
    }
    Ok(())
}

impl PanelConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.base_url {
            validate_base_url(url)?;
        }
        if self.upload_chunk_size == Some(0) {
            return Err("Upload chunk size must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

impl PanelConfig {
    /// Create a new config builder.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    /// Create a config with defaults for everything but the URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            settle_delay_ms: 3000,
            connect_timeout_secs: 10,
            shortcuts: default_shortcuts(),
            default_upload_destination: "plugins".to_string(),
            upload_chunk_size: 64 * 1024,
            socket_path: "/socket.io/".to_string(),
        }
    }

    /// Default location of the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("craftpanel").join("config.toml"))
    }

    /// Load from an explicit file, or from the default location when it exists.
    ///
    /// Falls back to defaults when no file is given and none exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(default) if default.exists() => default,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.base_url).map_err(|message| ConfigError::Invalid { message })?;
        if self.upload_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                message: "Upload chunk size must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Settle delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

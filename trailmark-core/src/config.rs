//! Configuration types for the Trailmark recorder

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TrailmarkError};
use crate::retry::FlushRetryPolicy;

/// Main configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrailmarkConfig {
    /// Sampling and movement configuration
    #[serde(default)]
    pub recorder: RecorderConfig,

    /// Persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Autosave scheduler configuration
    #[serde(default)]
    pub autosave: AutosaveConfig,

    /// Export configuration
    #[serde(default)]
    pub export: ExportConfig,
}

/// Per-tick sampling and movement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Distance the character moves along x per tick of held input
    pub step_size: f64,

    /// Interaction radius used for points of interest built from config
    pub interaction_radius: f64,

    /// Crossing below this z unlocks indoor points of interest
    pub indoor_threshold_z: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            step_size: 0.2,
            interaction_radius: crate::world::INTERACTION_RADIUS,
            indoor_threshold_z: -160.0,
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend
    pub mode: StorageMode,

    /// Maximum number of stored episodes (unbounded if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_episodes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Jsonl {
                data_dir: default_data_dir(),
            },
            max_episodes: None,
        }
    }
}

/// Storage backend mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageMode {
    /// Volatile in-process store
    Memory,

    /// Append-only JSON-lines file
    Jsonl {
        /// Directory holding `episodes.jsonl`
        data_dir: PathBuf,
    },
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trailmark")
}

/// Autosave scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Run the periodic flush at all
    pub enabled: bool,

    /// Wall-clock period between flushes
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Retry policy for failed flushes
    #[serde(default)]
    pub retry: FlushRetryPolicy,

    /// Flush whatever is buffered when the session shuts down
    pub flush_on_shutdown: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
            retry: FlushRetryPolicy::single_attempt(),
            flush_on_shutdown: true,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Name of the offered file
    pub file_name: String,

    /// Directory the file is written into
    pub out_dir: PathBuf,

    /// Pretty-print the JSON document
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: crate::export::EXPORT_FILE_NAME.to_string(),
            out_dir: PathBuf::from("."),
            pretty: false,
        }
    }
}

/// Builder for TrailmarkConfig
pub struct ConfigBuilder {
    config: TrailmarkConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: TrailmarkConfig::default(),
        }
    }

    /// Set recorder configuration
    pub fn recorder(mut self, config: RecorderConfig) -> Self {
        self.config.recorder = config;
        self
    }

    /// Set storage configuration
    pub fn storage(mut self, config: StorageConfig) -> Self {
        self.config.storage = config;
        self
    }

    /// Use the in-memory store
    pub fn in_memory(mut self) -> Self {
        self.config.storage.mode = StorageMode::Memory;
        self
    }

    /// Set autosave configuration
    pub fn autosave(mut self, config: AutosaveConfig) -> Self {
        self.config.autosave = config;
        self
    }

    /// Set export configuration
    pub fn export(mut self, config: ExportConfig) -> Self {
        self.config.export = config;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<TrailmarkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailmarkConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `trailmark.toml` in the working directory
    /// 3. File named by `TRAILMARK_CONFIG_PATH`
    /// 4. `TRAILMARK_*` environment variables (nested keys split on `__`)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source is invalid.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(TrailmarkConfig::default()))
            .merge(Toml::file("trailmark.toml"));

        if let Ok(path) = std::env::var("TRAILMARK_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: TrailmarkConfig = figment
            .merge(Env::prefixed("TRAILMARK_").ignore(&["CONFIG_PATH"]).split("__"))
            .extract()
            .map_err(|e| {
                TrailmarkError::Configuration(format!("Failed to load configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// Keys missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let figment = Figment::from(Serialized::defaults(TrailmarkConfig::default()))
            .merge(Toml::file(path.as_ref()));
        let config: TrailmarkConfig = figment
            .extract()
            .map_err(|e| {
                TrailmarkError::Configuration(format!(
                    "Failed to load configuration file: {}",
                    e
                ))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.recorder.step_size.is_finite() && self.recorder.step_size > 0.0) {
            return Err(TrailmarkError::Configuration(format!(
                "step_size must be positive, got {}",
                self.recorder.step_size
            )));
        }
        if !(self.recorder.interaction_radius.is_finite() && self.recorder.interaction_radius > 0.0)
        {
            return Err(TrailmarkError::Configuration(format!(
                "interaction_radius must be positive, got {}",
                self.recorder.interaction_radius
            )));
        }
        if self.autosave.interval.is_zero() {
            return Err(TrailmarkError::Configuration(
                "autosave interval must be non-zero".to_string(),
            ));
        }
        if self.autosave.retry.attempts == 0 {
            return Err(TrailmarkError::Configuration(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        if self.storage.max_episodes == Some(0) {
            return Err(TrailmarkError::Configuration(
                "max_episodes must be at least 1 when set".to_string(),
            ));
        }
        if self.export.file_name.trim().is_empty() {
            return Err(TrailmarkError::Configuration(
                "export file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

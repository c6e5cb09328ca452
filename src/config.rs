//! Configuration management module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::matrix::{DEFAULT_BAUD_RATE, Timeouts};
use crate::matrix::protocol::DEFAULT_CHUNK_SIZE;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (defaults apply).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub logging: LoggingConfig,
}

/// Serial link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port path (empty: must be given on the command line).
    pub port: String,
    /// Line speed (default: 115200).
    pub baud_rate: u32,
    /// Read timeout for ordinary commands in milliseconds (default: 2000).
    pub timeout_ms: u64,
    /// Read timeout for bitmap and sprite uploads in milliseconds (default: 10000).
    pub bulk_timeout_ms: u64,
    /// Payload bytes per flow-controlled chunk (default: 128).
    pub chunk_size: usize,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset (default: "info").
    pub level: String,
    /// Optional log file; stderr only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Get config file path (platform config directory).
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "matrix-display")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Validation("Baud rate must be greater than 0".to_string()));
        }
        if self.serial.timeout_ms < 100 {
            return Err(ConfigError::Validation(
                "Command timeout must be at least 100 ms".to_string(),
            ));
        }
        if self.serial.bulk_timeout_ms < self.serial.timeout_ms {
            return Err(ConfigError::Validation(
                "Bulk timeout cannot be shorter than the command timeout".to_string(),
            ));
        }
        if !(2..=4096).contains(&self.serial.chunk_size) {
            return Err(ConfigError::Validation(
                "Chunk size must be between 2 and 4096 bytes".to_string(),
            ));
        }
        if self.serial.chunk_size % 2 != 0 {
            return Err(ConfigError::Validation(
                "Chunk size must hold whole pixels (even number of bytes)".to_string(),
            ));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl SerialConfig {
    /// Read timeouts as used by the display client.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            command: Duration::from_millis(self.timeout_ms),
            bulk: Duration::from_millis(self.bulk_timeout_ms),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 2_000,
            bulk_timeout_ms: 10_000,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

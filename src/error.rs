//! Error types and handling.

use thiserror::Error;

use crate::config::ConfigError;
use crate::matrix::{Acknowledgment, ValidationError};

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Command arguments rejected before sending
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Data parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Device or link reported failure
    #[error("Device error: {0}")]
    Device(String),

    /// No serial port configured or given
    #[error("No serial port given; pass --port or set serial.port in the config file")]
    NoPort,
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a parse error with message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl Acknowledgment {
    /// Turn a failed acknowledgment into an error, for callers that stop on failure.
    pub fn into_result(self) -> Result<Acknowledgment> {
        if self.success {
            Ok(self)
        } else {
            Err(AppError::Device(self.message))
        }
    }
}

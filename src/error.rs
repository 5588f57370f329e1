//! # Error Types
//!
//! Custom error types for Joydrive using `thiserror`.

use thiserror::Error;

/// Main error type for Joydrive
#[derive(Debug, Error)]
pub enum JoydriveError {
    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but a value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input device access errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable input device was found
    #[error("No joystick found")]
    ControllerNotFound,

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// A motor endpoint did not accept a command in time
    #[error("Motor endpoint {endpoint} timed out after {timeout_ms} ms")]
    LinkTimeout { endpoint: String, timeout_ms: u64 },
}

/// Result type alias for Joydrive
pub type Result<T> = std::result::Result<T, JoydriveError>;

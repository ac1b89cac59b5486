//! # Error Types
//!
//! Custom error types for Joystick Relay using `thiserror`.

use thiserror::Error;

/// Main error type for Joystick Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Frame protocol errors (wrong size or shape on decode)
    #[error("Frame protocol error: {0}")]
    Protocol(String),

    /// ADC or GPIO collaborator failures
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Destination string could not be parsed or resolved
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// The sampling thread ended abnormally
    #[error("Sampling task failed: {0}")]
    Task(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "rpi")]
impl From<rppal::gpio::Error> for RelayError {
    fn from(e: rppal::gpio::Error) -> Self {
        RelayError::Hardware(format!("GPIO: {}", e))
    }
}

#[cfg(feature = "rpi")]
impl From<rppal::i2c::Error> for RelayError {
    fn from(e: rppal::i2c::Error) -> Self {
        RelayError::Hardware(format!("I2C: {}", e))
    }
}

/// Result type alias for Joystick Relay
pub type Result<T> = std::result::Result<T, RelayError>;

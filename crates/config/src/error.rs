//! Configuration error types

use thiserror::Error;

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape
    #[error("invalid {var}={value}: expected {expected}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// The offending value
        value: String,
        /// What a valid value looks like
        expected: &'static str,
    },
}

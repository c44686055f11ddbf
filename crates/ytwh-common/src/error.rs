//! Error types shared across ytwh crates

use thiserror::Error;

/// Result type alias for shared ytwh operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Errors raised by shared infrastructure (configuration and logging)
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl HarvestError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a logging error
    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }
}

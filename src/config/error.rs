//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Spreadsheet id cannot be empty: {0}")]
    EmptySheetId(&'static str),

    #[error("Invalid A1 range: {0}")]
    InvalidRange(&'static str),

    #[error("Broadcast chat id cannot be zero")]
    InvalidBroadcastChat,

    #[error("Cache TTL must be between 1 and 86400 seconds")]
    InvalidCacheTtl,

    #[error("Order id width must be between 3 and 12 digits")]
    InvalidOrderIdWidth,
}

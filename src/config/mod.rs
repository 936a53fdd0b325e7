//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `QUARTERMASTER_` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use quartermaster::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Broadcasting to chat {}", config.bot.broadcast_chat);
//! ```

mod bot;
mod error;
mod sheets;

pub use bot::BotConfig;
pub use error::{ConfigError, ValidationError};
pub use sheets::SheetsConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the quartermaster core.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Spreadsheet ids and ranges for the backing tables
    pub sheets: SheetsConfig,

    /// Conversation and notification settings
    pub bot: BotConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `QUARTERMASTER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `QUARTERMASTER__BOT__BROADCAST_CHAT=-100123` -> `bot.broadcast_chat = -100123`
    /// - `QUARTERMASTER__SHEETS__CATALOG_SHEET_ID=...` -> `sheets.catalog_sheet_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("QUARTERMASTER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.sheets.validate()?;
        self.bot.validate()?;
        Ok(())
    }
}

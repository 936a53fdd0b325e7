//! Bot behavior configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Conversation and notification settings
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Chat every recorded order is announced to
    pub broadcast_chat: i64,

    /// Catalog cache time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub catalog_ttl_secs: u64,

    /// Destination directory cache time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub destinations_ttl_secs: u64,

    /// Zero-padded width of formatted order ids
    #[serde(default = "default_order_id_width")]
    pub order_id_width: usize,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.broadcast_chat == 0 {
            return Err(ValidationError::InvalidBroadcastChat);
        }
        for ttl in [self.catalog_ttl_secs, self.destinations_ttl_secs] {
            if ttl == 0 || ttl > 86_400 {
                return Err(ValidationError::InvalidCacheTtl);
            }
        }
        if self.order_id_width < 3 || self.order_id_width > 12 {
            return Err(ValidationError::InvalidOrderIdWidth);
        }
        Ok(())
    }
}

fn default_cache_ttl() -> u64 {
    1800
}

fn default_order_id_width() -> usize {
    5
}

fn default_log_level() -> String {
    "info,quartermaster=debug".to_string()
}

use std::time::Duration;

use config::{Config, File};
pub use config::ConfigError;
use serde::Deserialize;

use crate::consts::DEFAULT_REQUEST_TIMEOUT_MS;

/// Runtime configuration for a [`MerchantClient`](crate::MerchantClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Merchant API key used by `authenticate`
    pub api_key: String,
    /// Re-authenticate automatically after a disconnect (default true)
    pub reconnect: bool,
    /// Maintain the in-memory market mirror (default true)
    pub cache: bool,
    /// Upper bound on how long any request waits for its acknowledgment
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with the default toggles
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            reconnect: true,
            cache: true,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    /// Toggle automatic re-authentication after a disconnect
    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Toggle the in-memory market mirror
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Override the per-request acknowledgment timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// File/environment-backed settings, used by the binaries
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Merchant client configuration
    pub merchant: MerchantSettings,
    /// Logging configuration
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct MerchantSettings {
    /// Merchant API key
    /// In production, consider loading this from ENV variables only
    pub api_key: String,
    #[serde(default = "default_reconnect")]
    pub reconnect: bool,
    #[serde(default = "default_cache")]
    pub cache: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_reconnect() -> bool {
    true
}

fn default_cache() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

#[derive(Debug, Deserialize, Default)]
pub struct LogSettings {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from a configuration file
    pub fn new(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Add configuration file
            .add_source(File::with_name(config_path))
            // Add environment variables (overrides file)
            // e.g. SKINCRIB_MERCHANT__API_KEY=...
            .add_source(config::Environment::with_prefix("SKINCRIB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl From<&MerchantSettings> for ClientConfig {
    fn from(s: &MerchantSettings) -> Self {
        ClientConfig::new(s.api_key.clone())
            .with_reconnect(s.reconnect)
            .with_cache(s.cache)
            .with_request_timeout(Duration::from_millis(s.request_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("key");
        assert!(config.reconnect);
        assert!(config.cache);
        assert_eq!(
            config.request_timeout,
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_client_config_builders() {
        let config = ClientConfig::new("key")
            .with_reconnect(false)
            .with_cache(false)
            .with_request_timeout(Duration::from_secs(5));
        assert!(!config.reconnect);
        assert!(!config.cache);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}

use crate::traits::reconnect::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use crate::traits::ExponentialBackoff;
use crate::core::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable that overrides [`ClientConfig::url`]
pub const URL_ENV_VAR: &str = "REALTIME_WS_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Realtime client configuration
///
/// ```yaml
/// url: wss://api.example.com/realtime
/// heartbeat_interval_ms: 30000
/// reconnect:
///   initial_delay_ms: 1000
///   max_delay_ms: 10000
///   max_attempts: 5
/// channels:
///   - circle:42
/// log_level: info
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket URL (wss:// or ws://)
    pub url: String,

    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Channels the listener joins after every successful connect
    #[serde(default)]
    pub channels: Vec<String>,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_heartbeat_interval_ms() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL.as_millis() as u64
}

fn default_initial_delay_ms() -> u64 {
    DEFAULT_INITIAL_DELAY.as_millis() as u64
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY.as_millis() as u64
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ReconnectConfig {
    pub fn strategy(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            Some(self.max_attempts),
        )
    }
}

impl ClientConfig {
    /// Configuration with every default and the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            reconnect: ReconnectConfig::default(),
            channels: Vec::new(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from a YAML file
    ///
    /// `REALTIME_WS_URL`, when set, replaces the file's `url`.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: ClientConfig = serde_yaml::from_str(&yaml_content)?;

        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            info!("Overriding realtime URL from environment variable");
            config.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(format!(
                "url must start with ws:// or wss://, got '{}'",
                self.url
            )));
        }

        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            return Err(ConfigError::ValidationError(
                "reconnect.max_delay_ms must be at least reconnect.initial_delay_ms".to_string(),
            ));
        }

        if self.channels.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "channel names must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ReconnectionStrategy;
    use std::io::Write;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config: ClientConfig = serde_yaml::from_str("url: wss://example.com/ws\n").unwrap();

        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.reconnect.initial_delay_ms, 1000);
        assert_eq!(config.reconnect.max_delay_ms, 10_000);
        assert_eq!(config.reconnect.max_attempts, 5);
        assert!(config.channels.is_empty());
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reconnect_section_builds_strategy() {
        let yaml = "url: ws://localhost:4000\nreconnect:\n  initial_delay_ms: 250\n  max_attempts: 2\n";
        let config: ClientConfig = serde_yaml::from_str(yaml).unwrap();
        let strategy = config.reconnect.strategy();

        assert_eq!(strategy.next_delay(0), Some(Duration::from_millis(250)));
        assert_eq!(strategy.next_delay(1), Some(Duration::from_millis(500)));
        assert_eq!(strategy.next_delay(2), None);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ClientConfig::new("http://example.com");
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.url = "wss://example.com".to_string();
        config.heartbeat_interval_ms = 0;
        assert!(config.validate().is_err());

        config.heartbeat_interval_ms = 30_000;
        config.reconnect.max_delay_ms = 10;
        assert!(config.validate().is_err());

        config.reconnect = ReconnectConfig::default();
        config.channels = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "url: wss://example.com/ws").unwrap();
        writeln!(file, "heartbeat_interval_ms: 5000").unwrap();
        writeln!(file, "channels: [\"circle:1\", \"story:9\"]").unwrap();

        std::env::remove_var(URL_ENV_VAR);
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(config.channels, vec!["circle:1", "story:9"]);
    }

    #[test]
    fn test_load_missing_file_is_file_error() {
        let err = ClientConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileError(_)));
    }
}

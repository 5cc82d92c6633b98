//! CLI utilities for binaries
//!
//! Resolves the configuration path and the session identity from the
//! command line and environment.

use realtime::AuthState;
use std::path::PathBuf;

/// Session identity handed to the client at startup
pub const USER_ID_ENV_VAR: &str = "REALTIME_USER_ID";

/// Which configuration file to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Realtime client configuration (config/realtime.yaml)
    Realtime,
    /// Explicit path, e.g. from the command line
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Realtime => "config/realtime.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Environment variable that overrides the default path
    ///
    /// An explicit path is never overridden.
    pub fn env_var_name(&self) -> Option<&str> {
        match self {
            ConfigType::Realtime => Some("CONFIG_PATH"),
            ConfigType::Custom(_) => None,
        }
    }
}

/// Load configuration path from environment or use default
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    config_type
        .env_var_name()
        .and_then(|name| std::env::var(name).ok())
        .unwrap_or_else(|| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// Settled session snapshot from `REALTIME_USER_ID`
///
/// Unset or blank means signed out: the client still connects but never
/// sends an identity claim and drops inbound events.
pub fn auth_from_env() -> AuthState {
    auth_from_value(std::env::var(USER_ID_ENV_VAR).ok())
}

fn auth_from_value(value: Option<String>) -> AuthState {
    match value {
        Some(id) if !id.trim().is_empty() => AuthState::signed_in(id.trim()),
        _ => AuthState::signed_out(),
    }
}

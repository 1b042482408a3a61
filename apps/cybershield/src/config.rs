//! # Configuration
//!
//! Server settings from an optional TOML file, with environment overrides.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! cors_origins = ["http://localhost:3000"]
//! rate_limit = 100
//! api_key = "secret"
//! body_limit_bytes = 2097152
//!
//! [dashboard]
//! recent_limit = 5
//! ```
//!
//! ## Environment Overrides
//!
//! - `CYBERSHIELD_API_KEY`: API key (empty disables authentication)
//! - `CYBERSHIELD_CORS_ORIGINS`: Comma-separated list of origins, or "*" for all
//! - `CYBERSHIELD_RATE_LIMIT`: Requests per second (0 disables rate limiting)

use crate::error::AppError;
use cybershield_core::primitives::DEFAULT_RECENT_LIMIT;
use serde::Deserialize;
use std::path::Path;

pub const ENV_API_KEY: &str = "CYBERSHIELD_API_KEY";
pub const ENV_CORS_ORIGINS: &str = "CYBERSHIELD_CORS_ORIGINS";
pub const ENV_RATE_LIMIT: &str = "CYBERSHIELD_RATE_LIMIT";

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default request body limit (2 MB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `None` means localhost only, `["*"]` means any origin.
    pub cors_origins: Option<Vec<String>>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Bearer key required on every route except `/health`.
    pub api_key: Option<String>,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            api_key: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub recent_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Read the config file if given, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(path) => {
                let metadata = std::fs::metadata(path).map_err(|e| {
                    AppError::Config(format!("Cannot read '{}': {}", path.display(), e))
                })?;
                if metadata.len() > MAX_CONFIG_FILE_SIZE {
                    return Err(AppError::Config(format!(
                        "Config file size {} bytes exceeds maximum {} bytes",
                        metadata.len(),
                        MAX_CONFIG_FILE_SIZE
                    )));
                }
                let text = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Config(format!("Cannot read '{}': {}", path.display(), e))
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.server.api_key = Some(key);
        }
        if let Some(origins) = lookup(ENV_CORS_ORIGINS) {
            self.server.cors_origins = Some(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        if let Some(rate) = lookup(ENV_RATE_LIMIT) {
            match rate.trim().parse() {
                Ok(rate) => self.server.rate_limit = rate,
                Err(_) => tracing::warn!("Ignoring invalid {}: '{}'", ENV_RATE_LIMIT, rate),
            }
        }
    }

    /// The API key, if authentication is enabled.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.server.api_key()
    }
}

impl ServerConfig {
    /// The API key, if authentication is enabled. An empty key disables it.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml("").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.dashboard.recent_limit, 5);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn sections_are_parsed() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9090
            cors_origins = ["https://cybershield.example"]
            rate_limit = 0
            api_key = "k"

            [dashboard]
            recent_limit = 10
            "#,
        )
        .expect("parse");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.rate_limit, 0);
        assert_eq!(config.api_key(), Some("k"));
        assert_eq!(config.dashboard.recent_limit, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("[server]\nprot = 1").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_toml("[server]\napi_key = \"file\"\nrate_limit = 5").expect("parse");
        config.apply_env(|key| match key {
            ENV_API_KEY => Some("env".to_string()),
            ENV_CORS_ORIGINS => Some("http://a.test, http://b.test,".to_string()),
            ENV_RATE_LIMIT => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key(), Some("env"));
        assert_eq!(
            config.server.cors_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
        assert_eq!(config.server.rate_limit, 5);
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let mut config = Config::default();
        config.apply_env(|key| (key == ENV_API_KEY).then(String::new));
        assert!(config.api_key().is_none());
    }

    #[test]
    fn server_section_exposes_api_key() {
        let server = ServerConfig {
            api_key: Some("k".to_string()),
            ..ServerConfig::default()
        };
        assert_eq!(server.api_key(), Some("k"));

        let blank = ServerConfig {
            api_key: Some(String::new()),
            ..ServerConfig::default()
        };
        assert!(blank.api_key().is_none());
    }
}

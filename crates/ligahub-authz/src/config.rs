//! Configuration for the authorization client.
//!
//! Values come from three sources, later ones overriding earlier ones:
//! hardcoded defaults, a YAML file, and `LIGAHUB_`-prefixed environment
//! variables (e.g. `LIGAHUB_API__BASE_URL`).

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::cache::CacheSettings;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AuthzConfig {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Permission cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiSettings {
    /// Base URL of the portal API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the permission query endpoint, relative to the base URL.
    #[serde(default = "default_query_path")]
    pub query_path: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            query_path: default_query_path(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_query_path() -> String {
    "api/permissions/query".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Permission cache settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of cached query results.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,

    /// Seconds a cached result stays servable.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    120
}

impl CacheConfig {
    /// Converts to the runtime cache settings.
    pub fn settings(&self) -> CacheSettings {
        CacheSettings::default()
            .with_max_capacity(self.max_capacity)
            .with_ttl(Duration::from_secs(self.ttl_secs))
    }
}

impl AuthzConfig {
    /// Loads configuration from a YAML file with env overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the file cannot be read or a value
    /// fails to deserialize.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
            .add_source(Environment::with_prefix("LIGAHUB").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Loads configuration from environment variables only.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a value fails to deserialize.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("LIGAHUB").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_freshness_window() {
        let config = AuthzConfig::default();

        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.cache.max_capacity, 10_000);
        assert_eq!(config.api.query_path, "api/permissions/query");
    }

    #[test]
    fn cache_config_converts_to_runtime_settings() {
        let config = CacheConfig {
            max_capacity: 5,
            ttl_secs: 7,
        };

        let settings = config.settings();

        assert_eq!(settings.max_capacity, 5);
        assert_eq!(settings.ttl, Duration::from_secs(7));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let json = "{\"api\": {\"base_url\": \"https://portal.example\"}}";
        let config: AuthzConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.api.base_url, "https://portal.example");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.cache.ttl_secs, 120);
    }
}

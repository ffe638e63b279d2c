//! Runtime configuration read from `PROVCAP_*` environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PROVCAP_SOURCES_URL` | `http://localhost:8131/api/sources/v3.1` |
//! | `PROVCAP_SOURCES_PROXY_URL` | unset |
//! | `PROVCAP_SOURCES_TIMEOUT_MS` | `5000` |
//! | `PROVCAP_SOURCES_APP_NAME` | `/insights/platform/provisioning` |
//! | `PROVCAP_APP_TYPE_CACHE_TTL_SECS` | `86400` |

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SOURCES_URL: &str = "http://localhost:8131/api/sources/v3.1";
pub const PROVISIONING_APP_NAME: &str = "/insights/platform/provisioning";

const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_APP_TYPE_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} cannot be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcesConfig {
    /// Base URL of the Sources REST API, without a trailing slash.
    pub url: String,
    pub proxy_url: Option<String>,
    pub timeout_ms: u64,
    /// Application type name identifying provisioning in Sources.
    pub app_name: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_SOURCES_URL),
            proxy_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            app_name: String::from(PROVISIONING_APP_NAME),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub app_type_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            app_type_ttl: Duration::from_secs(DEFAULT_APP_TYPE_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub sources: SourcesConfig,
    pub cache: CacheConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unset and blank
    /// variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|value| value.trim().to_owned()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = read("PROVCAP_SOURCES_URL") {
            config.sources.url = url.trim_end_matches('/').to_owned();
            if config.sources.url.is_empty() {
                return Err(ConfigError::Empty {
                    key: "PROVCAP_SOURCES_URL",
                });
            }
        }
        config.sources.proxy_url = read("PROVCAP_SOURCES_PROXY_URL");
        if let Some(value) = read("PROVCAP_SOURCES_TIMEOUT_MS") {
            config.sources.timeout_ms = parse_number("PROVCAP_SOURCES_TIMEOUT_MS", value)?;
        }
        if let Some(name) = read("PROVCAP_SOURCES_APP_NAME") {
            config.sources.app_name = name;
        }
        if let Some(value) = read("PROVCAP_APP_TYPE_CACHE_TTL_SECS") {
            let secs = parse_number("PROVCAP_APP_TYPE_CACHE_TTL_SECS", value)?;
            config.cache.app_type_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_number(key: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber { key, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config, Config::default());
        assert_eq!(config.sources.app_name, PROVISIONING_APP_NAME);
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("PROVCAP_SOURCES_URL", "https://sources.test/api/sources/v3.1/"),
            ("PROVCAP_SOURCES_PROXY_URL", "http://proxy.test:3128"),
            ("PROVCAP_SOURCES_TIMEOUT_MS", "1500"),
            ("PROVCAP_APP_TYPE_CACHE_TTL_SECS", "60"),
        ]))
        .expect("valid overrides");

        assert_eq!(config.sources.url, "https://sources.test/api/sources/v3.1");
        assert_eq!(config.sources.proxy_url.as_deref(), Some("http://proxy.test:3128"));
        assert_eq!(config.sources.timeout_ms, 1_500);
        assert_eq!(config.cache.app_type_ttl, Duration::from_secs(60));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[("PROVCAP_SOURCES_PROXY_URL", "  ")]))
            .expect("blank is unset");
        assert_eq!(config.sources.proxy_url, None);
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let error = Config::from_lookup(lookup_from(&[("PROVCAP_SOURCES_TIMEOUT_MS", "soon")]))
            .expect_err("not a number");
        assert_eq!(
            error,
            ConfigError::InvalidNumber {
                key: "PROVCAP_SOURCES_TIMEOUT_MS",
                value: String::from("soon"),
            }
        );
    }

    #[test]
    fn url_of_only_slashes_is_rejected() {
        let error = Config::from_lookup(lookup_from(&[("PROVCAP_SOURCES_URL", "///")]))
            .expect_err("empty url");
        assert_eq!(error, ConfigError::Empty { key: "PROVCAP_SOURCES_URL" });
    }
}

//! # Configuration
//!
//! Settings are read from a TOML file (`--config`, or `mezuro.toml` in the
//! working directory when present), then environment overrides, then CLI
//! flags. Every section and field is optional.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [database]
//! path = "mezuro.db"
//! backend = "redb"          # or "memory"
//!
//! [security]
//! cors_origins = ["http://localhost:3000"]
//! rate_limit = 100          # requests per second, 0 disables
//! secure_cookies = false
//!
//! [collectors]
//! processor_url = "http://localhost:8082"   # omit to use the static list below
//! timeout_secs = 10
//!
//! [[collectors.collector]]
//! name = "Analizo"
//! [collectors.collector.supported_metrics.loc]
//! name = "Lines of Code"
//! code = "loc"
//! scope = "CLASS"
//! ```
//!
//! ## Environment Overrides
//!
//! - `MEZURO_CORS_ORIGINS`: comma-separated origins, or `*`
//! - `MEZURO_RATE_LIMIT`: requests per second
//! - `MEZURO_PROCESSOR_URL`: base URL of the metric collector service

use clap::ValueEnum;
use mezuro_core::MetricCollector;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "mezuro.toml";

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Which store backs the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile in-memory tables.
    Memory,
    /// redb database file.
    #[default]
    Redb,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub backend: Backend,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mezuro.db"),
            backend: Backend::Redb,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// `None` means localhost only; `["*"]` allows every origin.
    pub cors_origins: Option<Vec<String>>,
    pub rate_limit: u32,
    pub secure_cookies: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            rate_limit: 100,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorsConfig {
    pub processor_url: Option<String>,
    pub timeout_secs: u64,
    #[serde(rename = "collector")]
    pub collectors: Vec<MetricCollector>,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            processor_url: None,
            timeout_secs: 10,
            collectors: Vec::new(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub collectors: CollectorsConfig,
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or from `mezuro.toml` if it exists, or defaults.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::read(p)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::read(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text, path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply `MEZURO_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origins) = lookup("MEZURO_CORS_ORIGINS") {
            self.security.cors_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        if let Some(limit) = lookup("MEZURO_RATE_LIMIT") {
            match limit.parse() {
                Ok(rps) => self.security.rate_limit = rps,
                Err(_) => tracing::warn!("Ignoring invalid MEZURO_RATE_LIMIT '{}'", limit),
            }
        }
        if let Some(url) = lookup("MEZURO_PROCESSOR_URL").filter(|u| !u.is_empty()) {
            self.collectors.processor_url = Some(url);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = AppConfig::from_toml("", Path::new("empty.toml")).expect("parse");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, Backend::Redb);
        assert_eq!(config.security.rate_limit, 100);
        assert!(config.collectors.processor_url.is_none());
    }

    #[test]
    fn parses_static_collectors() {
        let text = r#"
            [database]
            backend = "memory"

            [[collectors.collector]]
            name = "Analizo"
            description = "C, C++ and Java"

            [collectors.collector.supported_metrics.loc]
            name = "Lines of Code"
            code = "loc"
            scope = "CLASS"
            type = "NativeMetricSnapshot"
            languages = ["C", "JAVA"]
        "#;
        let config = AppConfig::from_toml(text, Path::new("mezuro.toml")).expect("parse");
        assert_eq!(config.database.backend, Backend::Memory);
        let analizo = &config.collectors.collectors[0];
        assert_eq!(analizo.name, "Analizo");
        assert_eq!(
            analizo.metric("Lines of Code").map(|m| m.code),
            Some("loc".to_string())
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = AppConfig::from_toml("[server]\nhots = \"x\"\n", Path::new("bad.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "MEZURO_CORS_ORIGINS" => Some("http://a.test, http://b.test".to_string()),
            "MEZURO_RATE_LIMIT" => Some("0".to_string()),
            "MEZURO_PROCESSOR_URL" => Some("http://processor.test".to_string()),
            _ => None,
        });
        assert_eq!(
            config.security.cors_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
        assert_eq!(config.security.rate_limit, 0);
        assert_eq!(
            config.collectors.processor_url.as_deref(),
            Some("http://processor.test")
        );
    }

    #[test]
    fn invalid_rate_limit_env_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|key| (key == "MEZURO_RATE_LIMIT").then(|| "lots".to_string()));
        assert_eq!(config.security.rate_limit, 100);
    }
}

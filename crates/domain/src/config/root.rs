use serde::{Deserialize, Serialize};
use std::path::Path;

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::fallback::FallbackConfig;
use super::logging::LoggingConfig;
use super::remote::RemoteConfig;

/// Main keycache configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub documents_path: Option<String>,
    pub default_ttl_secs: Option<u64>,
    pub static_fallback: Option<bool>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file (or defaults) and apply CLI overrides.
    ///
    /// A missing `config_path` yields the defaults; a path that cannot be read
    /// or parsed is an error.
    pub fn load(config_path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(path) = overrides.documents_path {
            self.remote.documents_path = Some(path);
        }
        if let Some(ttl) = overrides.default_ttl_secs {
            self.cache.default_ttl_secs = ttl;
        }
        if let Some(enabled) = overrides.static_fallback {
            self.fallback.enabled = enabled;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.change_buffer == 0 {
            return Err(ConfigError::Validation(
                "cache.change_buffer must be greater than 0".to_string(),
            ));
        }
        if self.remote.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "remote.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if let Some(path) = &self.remote.documents_path {
            if path.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "remote.documents_path cannot be empty".to_string(),
                ));
            }
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                LEVELS, self.logging.level
            )));
        }
        Ok(())
    }
}

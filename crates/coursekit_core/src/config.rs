//! Core configuration loaded from JSON.
//!
//! # Responsibility
//! - Describe logging, database and cache settings with defaults for every
//!   field.
//! - Validate values before a [`crate::context::CoreContext`] is built.
//!
//! # Invariants
//! - `cache.max_size >= 1` and `cache.ttl_secs >= 1` after validation.
//! - `log_dir`, when set, is an absolute path.

use crate::cache::CacheOptions;
use crate::logging::{LogLevel, LoggingError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration load or validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    BadConfig(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::BadConfig(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::BadConfig(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::BadConfig(value)
    }
}

/// Cache section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl_secs: u64,
    /// Mirror caches into the database when one is configured.
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl_secs: 300,
            persist: true,
        }
    }
}

impl CacheConfig {
    pub fn options(&self) -> CacheOptions {
        CacheOptions {
            max_size: self.max_size,
            ttl: Duration::from_secs(self.ttl_secs),
        }
    }
}

/// Top-level core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// `trace|debug|info|warn|error`; build default when absent.
    pub log_level: Option<String>,
    /// File logging is off when absent.
    pub log_dir: Option<PathBuf>,
    /// In-memory database when absent.
    pub database_path: Option<PathBuf>,
    pub cache: CacheConfig,
}

impl CoreConfig {
    /// Parses and validates JSON config text.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.log_level()?;
        if self.cache.max_size == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_size must be at least 1".to_string(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.ttl_secs must be at least 1".to_string(),
            ));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Configured level, or the build default.
    pub fn log_level(&self) -> ConfigResult<LogLevel> {
        match self.log_level.as_deref() {
            Some(value) => value
                .parse()
                .map_err(|err: LoggingError| ConfigError::Invalid(err.to_string())),
            None => Ok(LogLevel::build_default()),
        }
    }
}

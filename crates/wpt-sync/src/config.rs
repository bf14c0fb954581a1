//! Synchronizer configuration
//!
//! Loaded from TOML; every key is optional and falls back to [`SyncConfig::default`].
//!
//! ```toml
//! database_path = "works.db"
//! log_level = "info"
//! force_reinit_all = false
//!
//! [cache]
//! enabled = true
//! ttl_secs = 300
//! max_capacity = 10000
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Synchronizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// View cache settings
    pub cache: CacheConfig,
    /// SQLite database used by the console
    pub database_path: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether `reinit-all` overwrites existing activities by default
    pub force_reinit_all: bool,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on invalid TOML.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if unreadable, [`ConfigError::Parse`] on invalid TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// With cache TTL
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl_secs = ttl.as_secs();
        self
    }

    /// With caching turned on or off
    #[inline]
    #[must_use]
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    /// With database path
    #[inline]
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            database_path: PathBuf::from("works.db"),
            log_level: "info".to_string(),
            force_reinit_all: false,
        }
    }
}

/// View cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl CacheConfig {
    /// Entry time-to-live
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_capacity: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = SyncConfig::from_toml_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn partial_toml_overrides_keys() {
        let config = SyncConfig::from_toml_str(
            r#"
            database_path = "/var/lib/wpt/works.db"

            [cache]
            ttl_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/wpt/works.db"));
        assert_eq!(config.cache.ttl(), Duration::from_secs(30));
        assert!(config.cache.enabled);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn invalid_toml_rejected() {
        assert!(matches!(
            SyncConfig::from_toml_str("cache = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SyncConfig::from_file("/nonexistent/wpt.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builders() {
        let config = SyncConfig::new()
            .with_cache_enabled(false)
            .with_cache_ttl(Duration::from_secs(5))
            .with_database_path("x.db");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 5);
        assert_eq!(config.database_path, PathBuf::from("x.db"));
    }
}

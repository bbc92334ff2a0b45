//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_session::{CacheConfig, DEFAULT_CLEANUP_PERIOD, DEFAULT_MAX_SIZE};

use crate::error::{ConfigError, Result};

/// Root configuration.
///
/// Every section and key is optional; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Session cache settings.
    pub cache: CacheSection,
    /// Log output settings.
    pub logging: LoggingSection,
}

impl WardenConfig {
    /// Create a new config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_size == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.max_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cache.cleanup_period_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.cleanup_period_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "logging.filter".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session cache configuration.
///
/// ```toml
/// [cache]
/// max_size = 1000
/// cleanup_period_secs = 86400
/// enable_cleanup_task = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Maximum number of sessions to keep before eviction.
    pub max_size: usize,
    /// Seconds between background sweeps of expired sessions.
    pub cleanup_period_secs: u64,
    /// Whether the auth service starts the background sweep.
    pub enable_cleanup_task: bool,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            cleanup_period_secs: DEFAULT_CLEANUP_PERIOD.as_secs(),
            enable_cleanup_task: true,
        }
    }
}

impl CacheSection {
    /// Cleanup period as a `Duration`.
    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cleanup_period_secs)
    }

    /// Build the cache's own config object.
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_max_size(self.max_size)
            .with_cleanup_period(self.cleanup_period())
            .with_cleanup_task(self.enable_cleanup_task)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log output configuration.
///
/// ```toml
/// [logging]
/// filter = "warden=info,warden_session=info,warden_auth=info,warn"
/// json = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `EnvFilter` directive string.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "warden=info,warden_session=info,warden_auth=info,warn".to_string(),
            json: false,
        }
    }
}

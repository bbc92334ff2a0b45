//! Configuration for the session cache.

use std::time::Duration;

/// Default maximum number of sessions to cache.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default interval between background sweeps of expired sessions (24 hours).
pub const DEFAULT_CLEANUP_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the session cache and its cleanup scheduler.
///
/// Owned by the caller and handed by reference to [`SessionCache::new`] and
/// [`CleanupScheduler::new`]; nothing in this crate reads process-wide state.
///
/// [`SessionCache::new`]: crate::SessionCache::new
/// [`CleanupScheduler::new`]: crate::CleanupScheduler::new
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of sessions held before eviction kicks in.
    ///
    /// Zero is treated as a capacity of one: a put is always admitted.
    pub max_size: usize,

    /// Interval between background sweeps of expired sessions.
    pub cleanup_period: Duration,

    /// Whether owners of a cache should run the background cleanup task.
    /// If false, expired sessions are only reclaimed on capacity pressure
    /// or by calling `sweep` directly.
    pub enable_cleanup_task: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            cleanup_period: DEFAULT_CLEANUP_PERIOD,
            enable_cleanup_task: true,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of sessions to cache.
    pub fn with_max_size(mut self, max: usize) -> Self {
        self.max_size = max;
        self
    }

    /// Set the cleanup period.
    pub fn with_cleanup_period(mut self, period: Duration) -> Self {
        self.cleanup_period = period;
        self
    }

    /// Enable or disable the background cleanup task.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Capacity actually enforced by the store.
    pub fn effective_capacity(&self) -> usize {
        self.max_size.max(1)
    }
}

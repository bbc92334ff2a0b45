//! In-memory cache of authenticated sessions.
//!
//! This crate provides the session store behind Warden's auth service:
//! - Two indexes (access token and identity id) kept in lockstep
//! - Lazy expiration on every read, plus bulk sweeps
//! - A capacity bound enforced by expired-first, oldest-first eviction
//! - A [`CleanupScheduler`] that sweeps in the background
//!
//! Nothing here fails: lookups return `None` whether a session was never
//! cached, has expired, or was evicted.
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_session::{CacheConfig, CleanupScheduler, SessionCache};
//!
//! let config = CacheConfig::default()
//!     .with_max_size(1000)
//!     .with_cleanup_period(Duration::from_secs(3600));
//!
//! let cache = SessionCache::new(&config);
//! let scheduler = CleanupScheduler::new(cache.clone(), &config);
//! scheduler.start();
//! ```

mod cache;
mod cleanup;
mod config;
mod eviction;
mod record;

pub use cache::{CacheStats, SessionCache};
pub use cleanup::CleanupScheduler;
pub use config::{CacheConfig, DEFAULT_CLEANUP_PERIOD, DEFAULT_MAX_SIZE};
pub use record::{Profile, SessionRecord};

//! Dual-indexed session cache with lazy expiration.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::eviction;
use crate::record::{Profile, SessionRecord};

/// A stored record plus its insertion sequence number.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) record: SessionRecord,
    /// Monotonic insertion counter; breaks `cached_at` ties during eviction.
    pub(crate) seq: u64,
}

/// Inner state protected by RwLock.
///
/// Both maps are only ever mutated together, under the same write guard.
#[derive(Debug, Default)]
pub(crate) struct CacheInner {
    /// Primary index: access token -> record.
    by_token: HashMap<String, Slot>,

    /// Secondary index: identity id -> access token.
    by_identity: HashMap<Uuid, String>,

    next_seq: u64,
}

impl CacheInner {
    pub(crate) fn len(&self) -> usize {
        self.by_token.len()
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (&String, &Slot)> {
        self.by_token.iter()
    }

    fn lookup(&self, token: &str, now: DateTime<Utc>) -> Option<&SessionRecord> {
        self.by_token
            .get(token)
            .map(|slot| &slot.record)
            .filter(|record| !record.is_expired_at(now))
    }

    fn token_for(&self, identity_id: &Uuid) -> Option<&str> {
        self.by_identity.get(identity_id).map(String::as_str)
    }

    /// Remove the record stored under `token` from both indexes.
    pub(crate) fn remove_token(&mut self, token: &str) -> Option<SessionRecord> {
        let slot = self.by_token.remove(token)?;
        let id = slot.record.identity_id;
        if self.by_identity.get(&id).is_some_and(|t| t == token) {
            self.by_identity.remove(&id);
        }
        Some(slot.record)
    }

    /// Remove the record mapped to `identity_id` from both indexes.
    pub(crate) fn remove_identity(&mut self, identity_id: &Uuid) -> Option<SessionRecord> {
        let token = self.by_identity.remove(identity_id)?;
        self.by_token.remove(&token).map(|slot| slot.record)
    }

    /// Remove every record expired at `now`. Returns how many were removed.
    pub(crate) fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .by_token
            .iter()
            .filter(|(_, slot)| slot.record.is_expired_at(now))
            .map(|(token, _)| token.clone())
            .collect();

        for token in &expired {
            self.remove_token(token);
        }
        expired.len()
    }

    fn insert(&mut self, token: String, record: SessionRecord) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_identity.insert(record.identity_id, token.clone());
        self.by_token.insert(token, Slot { record, seq });
    }

    fn is_consistent(&self) -> bool {
        if self.by_token.len() != self.by_identity.len() {
            return false;
        }
        let forward = self.by_token.iter().all(|(token, slot)| {
            self.by_identity
                .get(&slot.record.identity_id)
                .is_some_and(|t| t == token)
        });
        let backward = self.by_identity.iter().all(|(id, token)| {
            self.by_token
                .get(token)
                .is_some_and(|slot| slot.record.identity_id == *id)
        });
        forward && backward
    }
}

/// Session cache indexed by access token and by identity id.
///
/// This cache provides:
/// - Lazy expiration: lookups report records past `expires_at` as absent
/// - Capacity-bounded puts with expired-first, then oldest-first eviction
/// - Bulk `sweep` of expired records for the [`CleanupScheduler`]
/// - Thread-safe access via RwLock; reads share, writes exclude
///
/// Lookups hand out clones, so a caller can never mutate a stored record
/// except through [`put`](Self::put) or [`update_profile`](Self::update_profile).
///
/// [`CleanupScheduler`]: crate::CleanupScheduler
#[derive(Debug)]
pub struct SessionCache {
    inner: Arc<RwLock<CacheInner>>,
    config: CacheConfig,
}

impl SessionCache {
    /// Create an empty cache.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            config: config.clone(),
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert or replace a record under `token`.
    ///
    /// Any record previously stored under `token`, and any previous token
    /// mapping for `record.identity_id`, is dropped first. If the cache is
    /// still at capacity, expired records are reclaimed and, failing that,
    /// the oldest record by `cached_at` is evicted. The put always succeeds.
    pub async fn put(&self, token: impl Into<String>, record: SessionRecord) {
        let token = token.into();
        let capacity = self.config.effective_capacity();
        let mut inner = self.inner.write().await;

        if let Some(previous) = inner.remove_token(&token) {
            trace!(identity_id = %previous.identity_id, "Replacing record under existing token");
        }
        if inner.remove_identity(&record.identity_id).is_some() {
            debug!(identity_id = %record.identity_id, "Dropping previous token for identity");
        }

        if inner.len() >= capacity {
            let outcome = eviction::make_room(&mut inner, capacity, Utc::now());
            debug!(
                capacity,
                expired = outcome.expired,
                evicted = outcome.evicted,
                "Cache full, made room for new session"
            );
        }

        let identity_id = record.identity_id;
        inner.insert(token, record);

        trace!(
            identity_id = %identity_id,
            cache_size = inner.len(),
            "Session inserted into cache"
        );
    }

    /// Get a live record by access token.
    pub async fn get(&self, token: &str) -> Option<SessionRecord> {
        let inner = self.inner.read().await;
        inner.lookup(token, Utc::now()).cloned()
    }

    /// Get a live record by identity id.
    pub async fn get_by_user_id(&self, identity_id: &Uuid) -> Option<SessionRecord> {
        let inner = self.inner.read().await;
        let token = inner.token_for(identity_id)?;
        inner.lookup(token, Utc::now()).cloned()
    }

    /// Whether `token` maps to a live record.
    pub async fn is_valid(&self, token: &str) -> bool {
        let inner = self.inner.read().await;
        inner.lookup(token, Utc::now()).is_some()
    }

    /// Remove the record stored under `token`. No-op if absent.
    pub async fn delete(&self, token: &str) {
        let mut inner = self.inner.write().await;
        if let Some(record) = inner.remove_token(token) {
            debug!(identity_id = %record.identity_id, "Session removed by token");
        }
    }

    /// Remove the record belonging to `identity_id`. No-op if absent.
    pub async fn delete_by_user_id(&self, identity_id: &Uuid) {
        let mut inner = self.inner.write().await;
        if inner.remove_identity(identity_id).is_some() {
            debug!(identity_id = %identity_id, "Session removed by identity");
        }
    }

    /// Number of stored records, including expired ones not yet swept.
    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache holds no records at all.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.len() == 0
    }

    /// Remove every expired record. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.len();
        let removed = inner.purge_expired(Utc::now());

        if removed > 0 {
            debug!(
                removed,
                remaining = inner.len(),
                "Swept expired sessions"
            );
        } else {
            trace!(remaining = before, "Sweep found no expired sessions");
        }

        removed
    }

    /// Mutate the profile of a live record in place.
    ///
    /// Returns the updated record, or `None` if the identity has no live
    /// session. Expiration and insertion time are out of the closure's reach.
    pub async fn update_profile<F>(&self, identity_id: &Uuid, f: F) -> Option<SessionRecord>
    where
        F: FnOnce(&mut Profile),
    {
        let now = Utc::now();
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let token = inner.by_identity.get(identity_id)?;
        let slot = inner.by_token.get_mut(token)?;
        if slot.record.is_expired_at(now) {
            return None;
        }

        f(&mut slot.record.profile);
        trace!(identity_id = %identity_id, "Session profile updated in place");
        Some(slot.record.clone())
    }

    /// Verify both indexes agree: same size, and every token/identity pair
    /// resolves to the same record from either side.
    pub async fn is_consistent(&self) -> bool {
        self.inner.read().await.is_consistent()
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let inner = self.inner.read().await;
        CacheStats {
            size: inner.len(),
            capacity: self.config.effective_capacity(),
            expired: inner
                .slots()
                .filter(|(_, slot)| slot.record.is_expired_at(now))
                .count(),
        }
    }
}

impl Clone for SessionCache {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of stored records.
    pub size: usize,

    /// Enforced maximum size; a configured zero counts as one.
    pub capacity: usize,

    /// Records past their expiry still awaiting a sweep.
    pub expired: usize,
}

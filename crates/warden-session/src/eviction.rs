//! Capacity eviction for the session cache.
//!
//! Runs under the cache's write guard when a put finds the cache full:
//! 1. Reclaim every expired record.
//! 2. If still full, evict the record with the smallest `cached_at`,
//!    earliest insertion winning ties.
//!
//! This is a capacity safety valve rather than an LRU: reads never reorder
//! anything, and a still-valid but old session may be dropped under load.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cache::CacheInner;

/// What a call to [`make_room`] removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Eviction {
    /// Expired records reclaimed.
    pub(crate) expired: usize,
    /// Live records evicted for being oldest.
    pub(crate) evicted: usize,
}

/// Free space until the cache holds fewer than `capacity` records.
pub(crate) fn make_room(inner: &mut CacheInner, capacity: usize, now: DateTime<Utc>) -> Eviction {
    let mut outcome = Eviction {
        expired: inner.purge_expired(now),
        ..Eviction::default()
    };

    if outcome.expired > 0 {
        debug!(removed = outcome.expired, "Reclaimed expired sessions to make room");
    }

    while inner.len() >= capacity {
        let Some(token) = oldest_token(inner) else {
            break;
        };
        if let Some(record) = inner.remove_token(&token) {
            debug!(
                identity_id = %record.identity_id,
                cached_at = %record.cached_at,
                "Evicting oldest session to make room"
            );
            outcome.evicted += 1;
        }
    }

    outcome
}

/// Token of the record with the smallest `(cached_at, seq)`.
fn oldest_token(inner: &CacheInner) -> Option<String> {
    inner
        .slots()
        .min_by_key(|(_, slot)| (slot.record.cached_at, slot.seq))
        .map(|(token, _)| token.clone())
}

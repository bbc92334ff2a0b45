//! The session record held by the cache.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Mutable profile fields of an authenticated principal.
///
/// These are the only parts of a cached record that may change after
/// insertion (see [`SessionCache::update_profile`]).
///
/// [`SessionCache::update_profile`]: crate::SessionCache::update_profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub phone: String,
    /// Free-form date, conventionally `YYYY-MM-DD`.
    pub date_of_birth: String,
}

/// Cached representation of an authenticated principal.
///
/// Reachable from the cache by its access token and by its identity id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Stable identifier of the principal, issued by the identity provider.
    pub identity_id: Uuid,

    /// Bearer credential; the primary cache key.
    pub access_token: String,

    /// Credential used to obtain a new access token. Stored, never checked.
    pub refresh_token: String,

    /// Profile fields.
    pub profile: Profile,

    /// Instant after which lookups treat the record as absent.
    pub expires_at: DateTime<Utc>,

    /// When the record was inserted. Stored verbatim by the cache, so callers
    /// restamp it (e.g. via [`SessionRecord::new`]) on every insertion; it
    /// orders eviction.
    pub cached_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a record with an empty profile.
    pub fn new(
        identity_id: Uuid,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity_id,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            profile: Profile::default(),
            expires_at,
            cached_at: Utc::now(),
        }
    }

    /// Set the profile.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Whether the record is expired at `now` (`now >= expires_at`).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the record is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

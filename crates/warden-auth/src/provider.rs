//! The remote identity provider boundary.
//!
//! Warden does not talk to any provider itself. Hosts implement
//! [`IdentityProvider`] over whatever transport their provider speaks and
//! hand it to [`AuthService`](crate::AuthService); everything returned here
//! has already been validated by the provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, Result};
use crate::models::UserMetadata;

/// User object as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Provider-issued identity id (a UUID string).
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Free-form metadata; Warden reads `username`, `role`,
    /// `display_name` and `date_of_birth` from it.
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

impl ProviderUser {
    /// Read a string metadata field. Missing, null, or non-string values
    /// yield an empty string.
    pub fn metadata_str(&self, key: &str) -> String {
        match self.user_metadata.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

/// Session issued by a successful sign-up, sign-in, or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Lifetime in seconds, as reported by the provider.
    pub expires_in: i64,
    /// Absolute expiry as unix seconds.
    pub expires_at: i64,
    pub user: ProviderUser,
}

impl ProviderSession {
    /// Absolute expiry as a timestamp.
    pub fn expires_at_utc(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0).ok_or_else(|| {
            AuthError::Unmarshal(format!("expires_at out of range: {}", self.expires_at))
        })
    }
}

/// Remote operations Warden needs from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Register a new account and open a session for it.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        phone: &str,
        metadata: &UserMetadata,
    ) -> Result<ProviderSession>;

    /// Authenticate with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession>;

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession>;

    /// Update user metadata on behalf of the session holding `access_token`.
    async fn update_user(
        &self,
        access_token: &str,
        updates: &Map<String, Value>,
    ) -> Result<ProviderUser>;

    /// Delete an account (privileged).
    async fn delete_user(&self, identity_id: &str) -> Result<()>;

    /// Invalidate the session holding `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<()>;
}

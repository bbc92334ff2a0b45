//! Request and response types of the auth service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use warden_session::SessionRecord;

/// Public view of a cached user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date_of_birth: String,
}

impl From<&SessionRecord> for User {
    fn from(record: &SessionRecord) -> Self {
        let profile = &record.profile;
        Self {
            user_id: record.identity_id,
            email: profile.email.clone(),
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            role: profile.role.clone(),
            phone: profile.phone.clone(),
            date_of_birth: profile.date_of_birth.clone(),
        }
    }
}

/// Metadata supplied at registration. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    /// Name shown to others.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    /// Unique handle.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date_of_birth: String,
}

impl UserMetadata {
    /// The non-empty fields as a JSON object, ready for a provider payload.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Result of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Result of a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: String,
}

/// Result of a token refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub expires_at: i64,
    pub token_type: String,
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: String,
}

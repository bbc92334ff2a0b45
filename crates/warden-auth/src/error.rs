//! Error types for the auth service.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur in the auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity provider rejected or failed the call.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The provider returned an identity id that is not a UUID.
    #[error("Invalid identity id: {0}")]
    InvalidIdentity(String),

    /// No live session is cached for the given token or identity.
    #[error("User not found in cache")]
    UserNotFound,

    /// A provider response could not be interpreted.
    #[error("Failed to interpret provider response: {0}")]
    Unmarshal(String),
}

impl From<uuid::Error> for AuthError {
    fn from(e: uuid::Error) -> Self {
        AuthError::InvalidIdentity(e.to_string())
    }
}

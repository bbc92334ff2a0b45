//! Session-caching auth service for a remote identity provider.
//!
//! # Components
//!
//! - [`provider`]: the [`IdentityProvider`] trait hosts implement over their transport
//! - [`service`]: [`AuthService`], which handles register, login, refresh, update, delete, logout
//! - [`models`]: request/response types
//!
//! Sessions are held in a [`warden_session::SessionCache`]; provider errors
//! are returned before anything is cached.

pub mod error;
pub mod models;
pub mod provider;
pub mod service;

pub use error::{AuthError, Result};
pub use models::{LoginResponse, RefreshTokenResponse, RegisterResponse, User, UserMetadata};
pub use provider::{IdentityProvider, ProviderSession, ProviderUser};
pub use service::AuthService;

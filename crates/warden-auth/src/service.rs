//! Auth service: provider calls paired with session cache updates.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;
use warden_session::{CacheConfig, CleanupScheduler, Profile, SessionCache, SessionRecord};

use crate::error::{AuthError, Result};
use crate::models::{LoginResponse, RefreshTokenResponse, RegisterResponse, User, UserMetadata};
use crate::provider::{IdentityProvider, ProviderSession, ProviderUser};

/// Authentication front for a remote identity provider.
///
/// Every successful sign-up, sign-in, and refresh is cached under its access
/// token; lookups by token or identity are answered from the cache alone.
/// The service owns the cache's [`CleanupScheduler`].
#[derive(Debug)]
pub struct AuthService<P: IdentityProvider> {
    provider: P,
    cache: SessionCache,
    cleanup: CleanupScheduler,
    cleanup_enabled: bool,
}

impl<P: IdentityProvider> AuthService<P> {
    /// Create a service with an empty cache built from `config`.
    pub fn new(provider: P, config: &CacheConfig) -> Self {
        let cache = SessionCache::new(config);
        let cleanup = CleanupScheduler::new(cache.clone(), config);
        info!(
            max_size = config.max_size,
            cleanup_period_secs = config.cleanup_period.as_secs(),
            "Created auth service"
        );
        Self {
            provider,
            cache,
            cleanup,
            cleanup_enabled: config.enable_cleanup_task,
        }
    }

    /// The session cache.
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// The identity provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Register a new user and cache the resulting session.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        phone: &str,
        metadata: UserMetadata,
    ) -> Result<RegisterResponse> {
        debug!("Registering user");
        let session = self
            .provider
            .sign_up(email, password, phone, &metadata)
            .await
            .inspect_err(|e| warn!(error = %e, "Registration failed"))?;

        let mut profile = profile_from_user(&session.user);
        if profile.display_name.is_empty() {
            profile.display_name = metadata.display_name;
        }
        if profile.date_of_birth.is_empty() {
            profile.date_of_birth = metadata.date_of_birth;
        }

        let record = self.cache_session(&session, profile).await?;
        info!(identity_id = %record.identity_id, "Registered user");

        Ok(RegisterResponse {
            id: session.user.id,
            username: record.profile.username,
            email: record.profile.email,
            role: record.profile.role,
        })
    }

    /// Authenticate a user and cache the session, replacing any previous
    /// session of the same identity.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<LoginResponse> {
        debug!("Logging in user");
        let session = self
            .provider
            .sign_in(email, password)
            .await
            .inspect_err(|e| warn!(error = %e, "Login failed"))?;

        let record = self
            .cache_session(&session, profile_from_user(&session.user))
            .await?;
        info!(identity_id = %record.identity_id, "Logged in user");

        Ok(LoginResponse {
            token: session.access_token,
            id: session.user.id,
            email: record.profile.email,
            username: record.profile.username,
            role: record.profile.role,
        })
    }

    /// Look up a user with a live session by identity id.
    pub async fn get_user_by_id(&self, identity_id: &Uuid) -> Result<User> {
        let record = self
            .cache
            .get_by_user_id(identity_id)
            .await
            .ok_or(AuthError::UserNotFound)?;
        Ok(User::from(&record))
    }

    /// Look up the user holding `token`.
    pub async fn get_current_user(&self, token: &str) -> Result<User> {
        let record = self
            .cache
            .get(token)
            .await
            .ok_or(AuthError::UserNotFound)?;
        Ok(User::from(&record))
    }

    /// Push metadata updates to the provider, then apply the provider's
    /// view of the profile to the cached session in place.
    pub async fn update_user(
        &self,
        identity_id: &Uuid,
        updates: Map<String, Value>,
    ) -> Result<User> {
        let record = self
            .cache
            .get_by_user_id(identity_id)
            .await
            .ok_or(AuthError::UserNotFound)?;

        debug!(identity_id = %identity_id, fields = updates.len(), "Updating user");
        let user = self
            .provider
            .update_user(&record.access_token, &updates)
            .await
            .inspect_err(|e| warn!(identity_id = %identity_id, error = %e, "Update failed"))?;

        let fresh = profile_from_user(&user);
        let updated = self
            .cache
            .update_profile(identity_id, |profile| *profile = fresh.clone())
            .await;

        match updated {
            Some(record) => {
                info!(identity_id = %identity_id, "Updated user");
                Ok(User::from(&record))
            }
            None => {
                // Expired or evicted while the provider call was in flight
                warn!(identity_id = %identity_id, "Session left cache during update");
                let mut record = record;
                record.profile = fresh;
                Ok(User::from(&record))
            }
        }
    }

    /// Delete the account at the provider and drop its cached session.
    pub async fn delete_user(&self, identity_id: &Uuid) -> Result<()> {
        self.provider
            .delete_user(&identity_id.to_string())
            .await
            .inspect_err(|e| warn!(identity_id = %identity_id, error = %e, "Delete failed"))?;

        self.cache.delete_by_user_id(identity_id).await;
        info!(identity_id = %identity_id, "Deleted user");
        Ok(())
    }

    /// Sign out at the provider and drop the cached session.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.provider
            .sign_out(token)
            .await
            .inspect_err(|e| warn!(error = %e, "Logout failed"))?;

        self.cache.delete(token).await;
        info!("Logged out user");
        Ok(())
    }

    /// Exchange a refresh token for a new session. The new access token
    /// replaces the identity's previous one in the cache.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshTokenResponse> {
        debug!("Refreshing token");
        let session = self
            .provider
            .refresh(refresh_token)
            .await
            .inspect_err(|e| warn!(error = %e, "Token refresh failed"))?;

        let record = self
            .cache_session(&session, profile_from_user(&session.user))
            .await?;
        info!(identity_id = %record.identity_id, "Refreshed token");

        Ok(RefreshTokenResponse {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            expires_at: session.expires_at,
            token_type: session.token_type,
            id: session.user.id,
            email: record.profile.email,
            username: record.profile.username,
            role: record.profile.role,
        })
    }

    /// Start the background sweep. Returns `false` if it is disabled in the
    /// config or already running.
    pub fn start_cache_cleanup(&self) -> bool {
        if !self.cleanup_enabled {
            debug!("Cache cleanup disabled by config");
            return false;
        }
        self.cleanup.start()
    }

    /// Stop the background sweep. Returns `false` if it was not running.
    pub fn stop_cache_cleanup(&self) -> bool {
        self.cleanup.stop()
    }

    /// Whether the background sweep is running.
    pub fn is_cache_cleanup_running(&self) -> bool {
        self.cleanup.is_running()
    }

    async fn cache_session(
        &self,
        session: &ProviderSession,
        profile: Profile,
    ) -> Result<SessionRecord> {
        let identity_id = Uuid::parse_str(&session.user.id)?;
        let record = SessionRecord::new(
            identity_id,
            session.access_token.as_str(),
            session.refresh_token.as_str(),
            session.expires_at_utc()?,
        )
        .with_profile(profile);

        self.cache
            .put(session.access_token.as_str(), record.clone())
            .await;
        Ok(record)
    }
}

fn profile_from_user(user: &ProviderUser) -> Profile {
    Profile {
        email: user.email.clone(),
        username: user.metadata_str("username"),
        display_name: user.metadata_str("display_name"),
        role: user.metadata_str("role"),
        phone: user.phone.clone(),
        date_of_birth: user.metadata_str("date_of_birth"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Account {
        password: String,
        user: ProviderUser,
    }

    /// In-memory provider issuing sequential tokens.
    #[derive(Debug, Default)]
    struct FakeProvider {
        accounts: Mutex<HashMap<String, Account>>,
        refresh: Mutex<HashMap<String, String>>,
        issued: Mutex<u64>,
        ttl_secs: i64,
        fail: Mutex<bool>,
    }

    impl FakeProvider {
        fn new(ttl_secs: i64) -> Self {
            Self {
                ttl_secs,
                ..Self::default()
            }
        }

        fn check(&self) -> Result<()> {
            if *self.fail.lock() {
                return Err(AuthError::Provider("unavailable".to_string()));
            }
            Ok(())
        }

        fn issue(&self, email: &str) -> ProviderSession {
            let mut issued = self.issued.lock();
            *issued += 1;
            let access_token = format!("access-{}", *issued);
            let refresh_token = format!("refresh-{}", *issued);
            self.refresh
                .lock()
                .insert(refresh_token.clone(), email.to_string());

            let user = self.accounts.lock()[email].user.clone();
            ProviderSession {
                access_token,
                refresh_token,
                token_type: "bearer".to_string(),
                expires_in: self.ttl_secs,
                expires_at: Utc::now().timestamp() + self.ttl_secs,
                user,
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn sign_up(
            &self,
            email: &str,
            password: &str,
            phone: &str,
            metadata: &UserMetadata,
        ) -> Result<ProviderSession> {
            self.check()?;
            let mut user_metadata = metadata.to_map();
            // Providers echo back only what they store
            user_metadata.remove("display_name");
            let user = ProviderUser {
                id: Uuid::new_v4().to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                user_metadata,
            };
            self.accounts.lock().insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    user,
                },
            );
            Ok(self.issue(email))
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession> {
            self.check()?;
            let ok = self
                .accounts
                .lock()
                .get(email)
                .is_some_and(|a| a.password == password);
            if !ok {
                return Err(AuthError::Provider("invalid login credentials".to_string()));
            }
            Ok(self.issue(email))
        }

        async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession> {
            self.check()?;
            let email = self
                .refresh
                .lock()
                .remove(refresh_token)
                .ok_or_else(|| AuthError::Provider("invalid refresh token".to_string()))?;
            Ok(self.issue(&email))
        }

        async fn update_user(
            &self,
            _access_token: &str,
            updates: &Map<String, Value>,
        ) -> Result<ProviderUser> {
            self.check()?;
            let mut accounts = self.accounts.lock();
            let account = accounts
                .values_mut()
                .next()
                .ok_or_else(|| AuthError::Provider("no such user".to_string()))?;
            for (key, value) in updates {
                account.user.user_metadata.insert(key.clone(), value.clone());
            }
            Ok(account.user.clone())
        }

        async fn delete_user(&self, identity_id: &str) -> Result<()> {
            self.check()?;
            self.accounts.lock().retain(|_, a| a.user.id != identity_id);
            Ok(())
        }

        async fn sign_out(&self, _access_token: &str) -> Result<()> {
            self.check()
        }
    }

    fn service(ttl_secs: i64) -> AuthService<FakeProvider> {
        AuthService::new(FakeProvider::new(ttl_secs), &CacheConfig::new().with_max_size(10))
    }

    fn alice() -> UserMetadata {
        UserMetadata {
            display_name: "Alice A.".to_string(),
            username: "alice".to_string(),
            role: "admin".to_string(),
            date_of_birth: "1990-01-01".to_string(),
            ..UserMetadata::default()
        }
    }

    #[tokio::test]
    async fn test_register_caches_session() {
        let service = service(3600);
        let response = service
            .register_user("alice@example.com", "pw", "+100", alice())
            .await
            .unwrap();

        assert_eq!(response.username, "alice");
        assert_eq!(response.role, "admin");

        let id = Uuid::parse_str(&response.id).unwrap();
        let user = service.get_user_by_id(&id).await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.phone, "+100");
        // Falls back to the submitted metadata when the provider omits it
        assert_eq!(user.display_name, "Alice A.");
        assert_eq!(user.date_of_birth, "1990-01-01");
        assert_eq!(service.cache().count().await, 1);
    }

    #[tokio::test]
    async fn test_relogin_replaces_token() {
        let service = service(3600);
        service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();
        let first = service.login_user("alice@example.com", "pw").await.unwrap();
        let second = service.login_user("alice@example.com", "pw").await.unwrap();

        assert!(service.get_current_user(&first.token).await.is_err());
        let current = service.get_current_user(&second.token).await.unwrap();
        assert_eq!(current.username, "alice");
        assert_eq!(service.cache().count().await, 1);
    }

    #[tokio::test]
    async fn test_login_failure_leaves_cache_untouched() {
        let service = service(3600);
        let err = service.login_user("nobody@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
        assert_eq!(service.cache().count().await, 0);
    }

    #[tokio::test]
    async fn test_expired_session_not_found() {
        let service = service(-1);
        let response = service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();
        let id = Uuid::parse_str(&response.id).unwrap();

        assert!(matches!(
            service.get_user_by_id(&id).await,
            Err(AuthError::UserNotFound)
        ));
        assert_eq!(service.cache().count().await, 1);
    }

    #[tokio::test]
    async fn test_update_user_mutates_cached_profile() {
        let service = service(3600);
        let login = service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();
        let id = Uuid::parse_str(&login.id).unwrap();
        let before = service.cache().get_by_user_id(&id).await.unwrap();

        let updates = json!({ "display_name": "Al", "role": "owner" })
            .as_object()
            .cloned()
            .unwrap();
        let user = service.update_user(&id, updates).await.unwrap();

        assert_eq!(user.display_name, "Al");
        assert_eq!(user.role, "owner");
        assert_eq!(user.username, "alice");

        let after = service.cache().get_by_user_id(&id).await.unwrap();
        assert_eq!(after.profile.role, "owner");
        assert_eq!(after.access_token, before.access_token);
        assert_eq!(after.expires_at, before.expires_at);
        assert_eq!(after.cached_at, before.cached_at);
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let service = service(3600);
        let result = service.update_user(&Uuid::new_v4(), Map::new()).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_refresh_replaces_token() {
        let service = service(3600);
        let login = service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();
        let old_token = service
            .cache()
            .get_by_user_id(&Uuid::parse_str(&login.id).unwrap())
            .await
            .unwrap();

        let refreshed = service
            .refresh_token(&old_token.refresh_token)
            .await
            .unwrap();

        assert_ne!(refreshed.access_token, old_token.access_token);
        assert!(!service.cache().is_valid(&old_token.access_token).await);
        assert!(service.cache().is_valid(&refreshed.access_token).await);
        assert_eq!(refreshed.username, "alice");
        assert_eq!(service.cache().count().await, 1);
    }

    #[tokio::test]
    async fn test_logout_and_delete() {
        let service = service(3600);
        let registered = service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();
        let id = Uuid::parse_str(&registered.id).unwrap();
        let login = service.login_user("alice@example.com", "pw").await.unwrap();

        service.logout(&login.token).await.unwrap();
        assert!(service.get_current_user(&login.token).await.is_err());
        assert!(service.get_user_by_id(&id).await.is_err());

        let login = service.login_user("alice@example.com", "pw").await.unwrap();
        service.delete_user(&id).await.unwrap();
        assert!(service.get_current_user(&login.token).await.is_err());
        assert_eq!(service.cache().count().await, 0);
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_session() {
        let service = service(3600);
        service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();
        let login = service.login_user("alice@example.com", "pw").await.unwrap();

        *service.provider().fail.lock() = true;
        assert!(service.logout(&login.token).await.is_err());
        assert!(service.cache().is_valid(&login.token).await);
    }

    #[tokio::test]
    async fn test_invalid_identity_rejected() {
        let service = service(3600);
        service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();
        service
            .provider()
            .accounts
            .lock()
            .get_mut("alice@example.com")
            .unwrap()
            .user
            .id = "not-a-uuid".to_string();

        let err = service.login_user("alice@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidIdentity(_)));
    }

    #[tokio::test]
    async fn test_cache_cleanup_lifecycle() {
        let config = CacheConfig::new().with_cleanup_period(Duration::from_secs(3600));
        let service = AuthService::new(FakeProvider::new(-1), &config);
        service
            .register_user("alice@example.com", "pw", "", alice())
            .await
            .unwrap();

        assert!(service.start_cache_cleanup());
        assert!(!service.start_cache_cleanup());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(service.cache().count().await, 0);

        assert!(service.stop_cache_cleanup());
        assert!(!service.stop_cache_cleanup());
    }

    #[tokio::test]
    async fn test_cache_cleanup_disabled() {
        let config = CacheConfig::new().with_cleanup_task(false);
        let service = AuthService::new(FakeProvider::new(3600), &config);
        assert!(!service.start_cache_cleanup());
        assert!(!service.is_cache_cleanup_running());
    }
}

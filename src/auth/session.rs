use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::SecretString;
use std::sync::Arc;

use super::credentials::{CredentialChange, CredentialStore};
use super::AuthError;
use crate::api::TokenStore;
use crate::storage::{KeyValueStore, SESSION_LOGGED_IN_KEY, SESSION_LOGIN_TIME_KEY};

/// Gate in front of every admin operation.
///
/// A session is valid while the logged-in flag is set and less than the
/// configured lifetime has passed since login.
#[derive(Clone)]
pub struct AuthGuard {
    store: Arc<dyn KeyValueStore>,
    credentials: CredentialStore,
    tokens: TokenStore,
    lifetime: Duration,
}

impl AuthGuard {
    pub fn new(store: Arc<dyn KeyValueStore>, lifetime: Duration) -> Self {
        Self {
            credentials: CredentialStore::new(store.clone()),
            tokens: TokenStore::new(store.clone()),
            store,
            lifetime,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), AuthError> {
        self.login_at(username, password, Utc::now()).await
    }

    pub async fn login_at(
        &self,
        username: &str,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        if !self.credentials.verify(username.trim(), password).await? {
            tracing::warn!(username = %username, "Rejected admin login");
            return Err(AuthError::InvalidCredentials);
        }
        self.store.set(SESSION_LOGGED_IN_KEY, "true").await?;
        self.store
            .set(SESSION_LOGIN_TIME_KEY, &now.timestamp_millis().to_string())
            .await?;
        tracing::info!(username = %username, "Admin logged in");
        Ok(())
    }

    /// End the session and forget API tokens.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.remove(SESSION_LOGGED_IN_KEY).await?;
        self.store.remove(SESSION_LOGIN_TIME_KEY).await?;
        self.tokens.clear().await?;
        tracing::info!("Admin logged out");
        Ok(())
    }

    pub async fn require(&self) -> Result<(), AuthError> {
        self.require_at(Utc::now()).await
    }

    pub async fn require_at(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        match self.session_expiry().await? {
            Some(expiry) if now < expiry => Ok(()),
            _ => Err(AuthError::LoginRequired),
        }
    }

    /// When the current session ends, or `None` without a session.
    pub async fn session_expiry(&self) -> Result<Option<DateTime<Utc>>, AuthError> {
        if self.store.get(SESSION_LOGGED_IN_KEY).await?.as_deref() != Some("true") {
            return Ok(None);
        }
        let Some(raw) = self.store.get(SESSION_LOGIN_TIME_KEY).await? else {
            return Ok(None);
        };
        let login_time = raw
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        Ok(login_time.map(|t| t + self.lifetime))
    }

    /// Change the admin credentials. A new username ends the session.
    pub async fn change_credentials(
        &self,
        current_password: &SecretString,
        new_username: &str,
        new_password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<CredentialChange, AuthError> {
        let change = self
            .credentials
            .change(current_password, new_username, new_password, confirm_password)
            .await?;
        if change.relogin_required {
            self.logout().await?;
        }
        Ok(change)
    }
}

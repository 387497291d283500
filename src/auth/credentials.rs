use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::AuthError;
use crate::storage::{load_json, save_json, KeyValueStore, CREDENTIALS_KEY};
use crate::util::{validate_new_password, validate_username};

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCredentials {
    username: String,
    password_sha256: String,
}

impl StoredCredentials {
    fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password_sha256: digest(password),
        }
    }
}

fn digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Result of a successful credential change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialChange {
    /// The username changed, so the current session has been ended.
    pub relogin_required: bool,
}

/// The single admin account.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write the bootstrap account if none is stored yet.
    pub async fn ensure_default(&self) -> Result<()> {
        if self.store.get(CREDENTIALS_KEY).await?.is_none() {
            tracing::info!(username = DEFAULT_USERNAME, "Creating default admin account");
            self.save(&StoredCredentials::new(DEFAULT_USERNAME, DEFAULT_PASSWORD))
                .await?;
        }
        Ok(())
    }

    pub async fn username(&self) -> Result<String> {
        Ok(self.load().await?.username)
    }

    pub async fn verify(&self, username: &str, password: &SecretString) -> Result<bool> {
        let stored = self.load().await?;
        Ok(stored.username == username && stored.password_sha256 == digest(password.expose_secret()))
    }

    /// Replace username and password.
    ///
    /// Nothing is written unless every check passes.
    pub async fn change(
        &self,
        current_password: &SecretString,
        new_username: &str,
        new_password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<CredentialChange, AuthError> {
        let stored = self.load().await?;
        if stored.password_sha256 != digest(current_password.expose_secret()) {
            return Err(AuthError::WrongPassword);
        }
        let new_username = new_username.trim();
        validate_username(new_username)?;
        validate_new_password(new_password.expose_secret(), confirm_password.expose_secret())?;

        self.save(&StoredCredentials::new(
            new_username,
            new_password.expose_secret(),
        ))
        .await?;
        tracing::info!(username = %new_username, "Admin credentials updated");

        Ok(CredentialChange {
            relogin_required: stored.username != new_username,
        })
    }

    async fn load(&self) -> Result<StoredCredentials> {
        Ok(load_json(self.store.as_ref(), CREDENTIALS_KEY)
            .await?
            .unwrap_or_else(|| StoredCredentials::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)))
    }

    async fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        save_json(self.store.as_ref(), CREDENTIALS_KEY, credentials).await
    }
}

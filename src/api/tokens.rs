use anyhow::Result;
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;

use crate::storage::{
    KeyValueStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_LOGGED_IN_KEY,
    SESSION_LOGIN_TIME_KEY,
};

/// Body of `POST /token/`.
#[derive(Deserialize)]
pub(crate) struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body of `POST /token/refresh/`. Servers that rotate refresh tokens send a new one.
#[derive(Deserialize)]
pub(crate) struct RefreshedToken {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Bearer tokens persisted in the local store.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn access(&self) -> Result<Option<SecretString>> {
        Ok(self.store.get(ACCESS_TOKEN_KEY).await?.map(SecretString::from))
    }

    pub async fn refresh(&self) -> Result<Option<SecretString>> {
        Ok(self
            .store
            .get(REFRESH_TOKEN_KEY)
            .await?
            .map(SecretString::from))
    }

    pub async fn save(&self, access: &str, refresh: Option<&str>) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access).await?;
        if let Some(refresh) = refresh {
            self.store.set(REFRESH_TOKEN_KEY, refresh).await?;
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(REFRESH_TOKEN_KEY).await?;
        Ok(())
    }

    /// Drop tokens and the admin session after authentication has failed for good.
    pub(crate) async fn end_session(&self) {
        for key in [
            ACCESS_TOKEN_KEY,
            REFRESH_TOKEN_KEY,
            SESSION_LOGGED_IN_KEY,
            SESSION_LOGIN_TIME_KEY,
        ] {
            if let Err(e) = self.store.remove(key).await {
                tracing::warn!(key = key, error = %e, "Failed to clear stored session state");
            }
        }
    }
}

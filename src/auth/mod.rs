//! Admin account and session gate.

mod credentials;
mod session;

use thiserror::Error;

use crate::util::ValidationError;

pub use credentials::{CredentialChange, CredentialStore, DEFAULT_PASSWORD, DEFAULT_USERNAME};
pub use session::AuthGuard;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please log in to continue")]
    LoginRequired,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Current password is incorrect")]
    WrongPassword,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Local store error: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Store(err)
    }
}

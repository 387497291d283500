//! Core repository trait shared by the remote and local backends.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::ApiError;
use crate::domain::{Resource, ResourceKind};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Local store error: {0:#}")]
    Store(anyhow::Error),
    #[error("{} #{id} not found", kind.label())]
    NotFound { kind: ResourceKind, id: i64 },
}

impl From<anyhow::Error> for RepositoryError {
    fn from(err: anyhow::Error) -> Self {
        RepositoryError::Store(err)
    }
}

impl RepositoryError {
    /// The server rejected our credentials even after a token refresh.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, RepositoryError::Api(ApiError::AuthenticationFailed))
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// CRUD over one content type.
///
/// Generic over any [`Resource`]. Implementations persist either to the
/// remote API or to the local key-value store; callers never know which.
#[async_trait]
pub trait Repository<T: Resource>: Send + Sync {
    /// List all records, in backend order.
    async fn list(&self) -> RepoResult<Vec<T>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<T>>;

    /// Persist a new record and return it with its assigned id.
    async fn create(&self, item: &T) -> RepoResult<T>;

    /// Replace the record stored under `id`.
    async fn update(&self, id: i64, item: &T) -> RepoResult<T>;

    async fn delete(&self, id: i64) -> RepoResult<()>;
}

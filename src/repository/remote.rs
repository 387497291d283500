use async_trait::async_trait;
use std::marker::PhantomData;

use super::traits::{RepoResult, Repository};
use crate::api::{ApiClient, ApiError};
use crate::domain::Resource;

/// Records persisted by the remote content API.
pub struct RemoteRepository<T> {
    api: ApiClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> RemoteRepository<T> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Resource> Repository<T> for RemoteRepository<T> {
    async fn list(&self) -> RepoResult<Vec<T>> {
        Ok(self.api.list::<T>().await?)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<T>> {
        match self.api.get::<T>(id).await {
            Ok(item) => Ok(Some(item)),
            Err(ApiError::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, item: &T) -> RepoResult<T> {
        Ok(self.api.create(item).await?)
    }

    async fn update(&self, id: i64, item: &T) -> RepoResult<T> {
        Ok(self.api.update(id, item).await?)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        Ok(self.api.delete::<T>(id).await?)
    }
}

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

use super::traits::{RepoResult, Repository, RepositoryError};
use crate::domain::Resource;
use crate::storage::{load_json, save_json, KeyValueStore};

/// Records kept as a JSON array under one key of the local store.
///
/// Ids are assigned as `max(existing) + 1`, starting at 1.
pub struct LocalRepository<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> LocalRepository<T> {
    /// Repository over the kind's default key.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, T::KIND.store_key())
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    async fn load(&self) -> RepoResult<Vec<T>> {
        Ok(load_json::<Vec<T>>(self.store.as_ref(), self.key)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, items: &[T]) -> RepoResult<()> {
        save_json(self.store.as_ref(), self.key, items).await?;
        Ok(())
    }

    /// Overwrite the stored list, e.g. to mirror a successful remote listing.
    pub async fn replace_all(&self, items: &[T]) -> RepoResult<()> {
        self.save(items).await
    }
}

fn next_id<T: Resource>(items: &[T]) -> i64 {
    items.iter().filter_map(Resource::id).max().unwrap_or(0) + 1
}

#[async_trait]
impl<T: Resource> Repository<T> for LocalRepository<T> {
    async fn list(&self) -> RepoResult<Vec<T>> {
        self.load().await
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<T>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|item| item.id() == Some(id)))
    }

    async fn create(&self, item: &T) -> RepoResult<T> {
        let mut items = self.load().await?;
        let mut created = item.clone();
        created.set_id(next_id(&items));
        created.keep_upload_locally();
        items.push(created.clone());
        self.save(&items).await?;
        tracing::debug!(kind = %T::KIND, id = ?created.id(), "Stored record locally");
        Ok(created)
    }

    async fn update(&self, id: i64, item: &T) -> RepoResult<T> {
        let mut items = self.load().await?;
        let slot = items
            .iter_mut()
            .find(|existing| existing.id() == Some(id))
            .ok_or(RepositoryError::NotFound { kind: T::KIND, id })?;

        let mut updated = item.clone();
        updated.set_id(id);
        updated.keep_upload_locally();
        *slot = updated.clone();
        self.save(&items).await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut items = self.load().await?;
        let before = items.len();
        items.retain(|item| item.id() != Some(id));
        if items.len() == before {
            return Err(RepositoryError::NotFound { kind: T::KIND, id });
        }
        self.save(&items).await
    }
}

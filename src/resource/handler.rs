use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::controller::{Prompt, ResourceController, ResourceError};
use crate::domain::{FormFields, Resource, ResourceKind};
use crate::render::Table;

/// Type-erased face of a [`ResourceController`], driven by raw form fields.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn list(&self) -> Result<Table, ResourceError>;

    async fn count(&self) -> Result<usize, ResourceError>;

    /// Create or update depending on edit mode; returns the record id.
    async fn submit(&self, form: &FormFields) -> Result<Option<i64>, ResourceError>;

    /// Enter edit mode and return the fields that pre-populate the form.
    async fn begin_edit(&self, id: i64) -> Result<FormFields, ResourceError>;

    fn cancel_edit(&self);

    async fn delete(&self, id: i64, prompt: &dyn Prompt) -> Result<(), ResourceError>;
}

#[async_trait]
impl<T: Resource> ResourceHandler for ResourceController<T> {
    fn kind(&self) -> ResourceKind {
        T::KIND
    }

    async fn list(&self) -> Result<Table, ResourceError> {
        let items = ResourceController::list(self).await?;
        Ok(Table::from_items(&items))
    }

    async fn count(&self) -> Result<usize, ResourceError> {
        ResourceController::count(self).await
    }

    async fn submit(&self, form: &FormFields) -> Result<Option<i64>, ResourceError> {
        Ok(ResourceController::submit(self, form).await?.id())
    }

    async fn begin_edit(&self, id: i64) -> Result<FormFields, ResourceError> {
        Ok(ResourceController::begin_edit(self, id).await?.to_form())
    }

    fn cancel_edit(&self) {
        ResourceController::cancel_edit(self)
    }

    async fn delete(&self, id: i64, prompt: &dyn Prompt) -> Result<(), ResourceError> {
        ResourceController::delete(self, id, prompt).await
    }
}

/// Handlers keyed by the content type they manage.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<ResourceKind, Arc<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same kind.
    pub fn register(&mut self, handler: Arc<dyn ResourceHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Arc<dyn ResourceHandler>> {
        self.handlers.get(&kind)
    }

    /// Registered kinds in display order.
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

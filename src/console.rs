//! Admin console: every content handler, the dashboard and the feedback
//! desk behind one facade.
//!
//! Successful mutations refresh the dashboard before returning, so the
//! figures shown next are never stale.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Backend;
use crate::dashboard::{Dashboard, DashboardSummary};
use crate::domain::{
    ContactInfo, Download, Faq, Feedback, FormFields, GalleryItem, News, Resource, ResourceKind,
    TeamMember,
};
use crate::notify::Notifier;
use crate::render::Table;
use crate::repository::{LocalRepository, RemoteRepository, Repository};
use crate::resource::{
    FeedbackDesk, HandlerRegistry, Prompt, ResourceController, ResourceError, ResourceHandler,
};
use crate::storage::{KeyValueStore, HERO_IMAGE_KEY};
use crate::util::{require, validate_email};

pub struct AdminConsole {
    backend: Backend,
    registry: Arc<HandlerRegistry>,
    dashboard: Dashboard,
    desk: Arc<FeedbackDesk>,
    notifier: Notifier,
    store: Arc<dyn KeyValueStore>,
    api: ApiClient,
}

/// Controller for `T` on the configured backend. Remote controllers keep a
/// local mirror to fall back on; local-only kinds ignore the backend.
fn controller<T: Resource>(
    backend: Backend,
    store: &Arc<dyn KeyValueStore>,
    api: &ApiClient,
    notifier: &Notifier,
) -> Arc<ResourceController<T>> {
    let local = LocalRepository::<T>::new(store.clone());
    let controller = if backend == Backend::Remote && !T::KIND.is_local_only() {
        let remote: Arc<dyn Repository<T>> = Arc::new(RemoteRepository::<T>::new(api.clone()));
        ResourceController::new(remote, Some(local), notifier.clone())
    } else {
        ResourceController::new(Arc::new(local), None, notifier.clone())
    };
    Arc::new(controller)
}

impl AdminConsole {
    pub fn new(
        backend: Backend,
        store: Arc<dyn KeyValueStore>,
        api: ApiClient,
        notifier: Notifier,
    ) -> Self {
        let feedback = controller::<Feedback>(backend, &store, &api, &notifier);

        let mut registry = HandlerRegistry::new();
        registry.register(controller::<News>(backend, &store, &api, &notifier));
        registry.register(controller::<Faq>(backend, &store, &api, &notifier));
        registry.register(controller::<Download>(backend, &store, &api, &notifier));
        registry.register(controller::<GalleryItem>(backend, &store, &api, &notifier));
        registry.register(controller::<TeamMember>(backend, &store, &api, &notifier));
        registry.register(feedback.clone());
        let registry = Arc::new(registry);

        let desk = Arc::new(match backend {
            Backend::Remote => FeedbackDesk::remote(feedback, api.clone(), store.clone()),
            Backend::Local => FeedbackDesk::local(feedback, store.clone()),
        });
        let dashboard = Dashboard::new(registry.clone(), desk.clone());

        tracing::debug!(backend = ?backend, kinds = registry.kinds().len(), "Admin console ready");
        Self {
            backend,
            registry,
            dashboard,
            desk,
            notifier,
            store,
            api,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn desk(&self) -> &FeedbackDesk {
        &self.desk
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn handler(&self, kind: ResourceKind) -> Option<&Arc<dyn ResourceHandler>> {
        let handler = self.registry.get(kind);
        if handler.is_none() {
            tracing::debug!(kind = %kind, "No handler registered, ignoring");
        }
        handler
    }

    pub async fn list(&self, kind: ResourceKind) -> Result<Option<Table>, ResourceError> {
        match self.handler(kind) {
            Some(handler) => Ok(Some(handler.list().await?)),
            None => Ok(None),
        }
    }

    /// Create a new record, ignoring any edit in progress.
    pub async fn create(
        &self,
        kind: ResourceKind,
        form: &FormFields,
    ) -> Result<Option<i64>, ResourceError> {
        let Some(handler) = self.handler(kind) else {
            return Ok(None);
        };
        handler.cancel_edit();
        let id = handler.submit(form).await?;
        self.dashboard.refresh().await;
        Ok(id)
    }

    /// Load record `id`, overlay `changes` on its fields and save it.
    pub async fn edit(
        &self,
        kind: ResourceKind,
        id: i64,
        changes: &FormFields,
    ) -> Result<Option<i64>, ResourceError> {
        let Some(handler) = self.handler(kind) else {
            return Ok(None);
        };
        let current = handler.begin_edit(id).await?;
        let saved = handler.submit(&current.merged(changes)).await;
        if saved.is_err() {
            handler.cancel_edit();
        }
        let saved = saved?;
        self.dashboard.refresh().await;
        Ok(saved)
    }

    pub async fn begin_edit(
        &self,
        kind: ResourceKind,
        id: i64,
    ) -> Result<Option<FormFields>, ResourceError> {
        match self.handler(kind) {
            Some(handler) => Ok(Some(handler.begin_edit(id).await?)),
            None => Ok(None),
        }
    }

    pub async fn delete(
        &self,
        kind: ResourceKind,
        id: i64,
        prompt: &dyn Prompt,
    ) -> Result<(), ResourceError> {
        let Some(handler) = self.handler(kind) else {
            return Ok(());
        };
        handler.delete(id, prompt).await?;
        self.dashboard.refresh().await;
        Ok(())
    }

    /// Open a feedback message, marking it read.
    pub async fn view_feedback(&self, id: i64) -> Result<Option<Feedback>, ResourceError> {
        let item = self.desk.view(id).await?;
        if item.is_some() {
            self.dashboard.refresh().await;
        }
        Ok(item)
    }

    /// Answer a feedback message.
    pub async fn reply_feedback(
        &self,
        id: i64,
        text: &str,
    ) -> Result<Option<Feedback>, ResourceError> {
        let item = self.desk.reply(id, text).await?;
        if item.is_some() {
            self.dashboard.refresh().await;
        }
        Ok(item)
    }

    pub async fn dashboard(&self) -> DashboardSummary {
        self.dashboard.refresh().await
    }

    /// Listing from the public, unauthenticated endpoints.
    pub async fn public(&self, kind: ResourceKind) -> Result<Option<Table>, ResourceError> {
        if kind.is_local_only() || self.backend == Backend::Local {
            return self.list(kind).await;
        }
        let table = match kind {
            ResourceKind::News => Table::from_items(&self.public_list::<News>().await?),
            ResourceKind::Faq => Table::from_items(&self.public_list::<Faq>().await?),
            ResourceKind::Download => Table::from_items(&self.public_list::<Download>().await?),
            ResourceKind::Gallery => Table::from_items(&self.public_list::<GalleryItem>().await?),
            ResourceKind::Team | ResourceKind::Feedback => {
                tracing::debug!(kind = %kind, "No public listing");
                return Ok(None);
            }
        };
        Ok(Some(table))
    }

    async fn public_list<T: Resource>(&self) -> Result<Vec<T>, ResourceError> {
        self.api.public_list::<T>().await.map_err(|e| {
            self.notifier.error(format!(
                "Error loading {}. Please try again.",
                T::KIND.plural()
            ));
            ResourceError::Repository(e.into())
        })
    }

    // ========================================================================
    // Site settings
    // ========================================================================

    pub async fn contact_info(&self) -> Result<Vec<ContactInfo>> {
        self.api
            .contact_info()
            .await
            .context("Failed to load contact information")
    }

    /// Apply `changes` to the contact entry `id` on the server.
    pub async fn update_contact_info(&self, id: i64, changes: &FormFields) -> Result<ContactInfo> {
        if self.backend == Backend::Local {
            bail!("Contact information is managed on the server; switch to the remote backend");
        }
        let mut info = self
            .contact_info()
            .await?
            .into_iter()
            .find(|c| c.id == Some(id))
            .with_context(|| format!("Contact entry #{} not found", id))?;

        for (field, value) in changes.iter() {
            match field {
                "branch" => info.branch = require("Branch", value)?.to_string(),
                "name" => info.name = require("Name", value)?.to_string(),
                "phone" => info.phone = require("Phone", value)?.to_string(),
                "address" => info.address = require("Address", value)?.to_string(),
                "email" => {
                    let email = require("Email", value)?;
                    validate_email(email)?;
                    info.email = email.to_string();
                }
                "working_hours" => {
                    let hours = value.trim();
                    info.working_hours = (!hours.is_empty()).then(|| hours.to_string());
                }
                other => bail!("Unknown contact field '{}'", other),
            }
        }

        let updated = self
            .api
            .update_contact_info(id, &info)
            .await
            .context("Failed to update contact information")?;
        self.notifier.success("Contact information updated successfully!");
        Ok(updated)
    }

    /// Point the homepage hero at an existing image file.
    pub async fn set_hero_image(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            bail!("Hero image '{}' does not exist", path.display());
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve '{}'", path.display()))?;
        self.store
            .set(HERO_IMAGE_KEY, &path.display().to_string())
            .await?;
        self.notifier.success("Hero image updated successfully!");
        Ok(())
    }

    pub async fn hero_image(&self) -> Result<Option<String>> {
        self.store.get(HERO_IMAGE_KEY).await
    }
}

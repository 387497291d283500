use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::domain::{FormFields, Resource, ResourceKind};
use crate::notify::Notifier;
use crate::repository::{LocalRepository, Repository, RepositoryError};
use crate::util::ValidationError;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("No {} is being edited", kind.label())]
    NotEditing { kind: ResourceKind },
    #[error("Cancelled")]
    Cancelled,
    #[error("{} #{id} not found", kind.label())]
    NotFound { kind: ResourceKind, id: i64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ResourceError {
    /// The session ended because the server rejected our tokens.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ResourceError::Repository(e) if e.is_auth_failure())
    }
}

/// Interactive yes/no confirmation before destructive actions.
pub trait Prompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Prompt for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// List/create/edit/delete for one content type, with the last rendered
/// listing kept as the view.
///
/// Mutations never touch the view directly: on success the list is
/// fetched again from the repository.
pub struct ResourceController<T: Resource> {
    primary: Arc<dyn Repository<T>>,
    mirror: Option<LocalRepository<T>>,
    notifier: Notifier,
    editing: Mutex<Option<i64>>,
    rows: Mutex<Vec<T>>,
}

impl<T: Resource> ResourceController<T> {
    /// `mirror` receives a copy of every successful listing and serves
    /// lists while `primary` is unavailable.
    pub fn new(
        primary: Arc<dyn Repository<T>>,
        mirror: Option<LocalRepository<T>>,
        notifier: Notifier,
    ) -> Self {
        Self {
            primary,
            mirror,
            notifier,
            editing: Mutex::new(None),
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn Repository<T>> {
        &self.primary
    }

    /// Fetch all items into the view.
    pub async fn list(&self) -> Result<Vec<T>, ResourceError> {
        let items = match self.fetch().await {
            Ok((items, from_mirror)) => {
                if from_mirror {
                    self.notifier.warning(format!(
                        "Could not reach the server. Showing locally saved {}.",
                        T::KIND.plural()
                    ));
                }
                items
            }
            Err(e) => {
                tracing::error!(kind = %T::KIND, error = %e, "Failed to load list");
                self.announce(&e, || {
                    format!("Error loading {}. Please try again.", T::KIND.plural())
                });
                return Err(e.into());
            }
        };
        *lock(&self.rows) = items.clone();
        Ok(items)
    }

    /// Number of stored items. Leaves the view alone.
    pub async fn count(&self) -> Result<usize, ResourceError> {
        Ok(self.fetch().await?.0.len())
    }

    /// Items from the last successful [`list`](Self::list).
    pub fn rows(&self) -> Vec<T> {
        lock(&self.rows).clone()
    }

    pub fn editing_id(&self) -> Option<i64> {
        *lock(&self.editing)
    }

    pub async fn create(&self, form: &FormFields) -> Result<T, ResourceError> {
        let item = self.parse(form)?;
        match self.primary.create(&item).await {
            Ok(created) => {
                self.notifier
                    .success(format!("{} saved successfully!", T::KIND.label()));
                self.reload().await;
                Ok(created)
            }
            Err(e) => Err(self.report_failure("saving", e)),
        }
    }

    /// Enter edit mode for `id` and return the record for the form.
    pub async fn begin_edit(&self, id: i64) -> Result<T, ResourceError> {
        let item = match self.primary.find_by_id(id).await {
            Ok(Some(item)) => item,
            Ok(None) => return Err(ResourceError::NotFound { kind: T::KIND, id }),
            Err(e) => return Err(self.report_failure("loading", e)),
        };
        *lock(&self.editing) = Some(id);
        Ok(item)
    }

    pub fn cancel_edit(&self) {
        lock(&self.editing).take();
    }

    /// Save the form over the record being edited.
    pub async fn update(&self, form: &FormFields) -> Result<T, ResourceError> {
        let id = self
            .editing_id()
            .ok_or(ResourceError::NotEditing { kind: T::KIND })?;
        let item = self.parse(form)?;
        match self.primary.update(id, &item).await {
            Ok(updated) => {
                self.cancel_edit();
                self.notifier
                    .success(format!("{} updated successfully!", T::KIND.label()));
                self.reload().await;
                Ok(updated)
            }
            Err(e) => Err(self.report_failure("updating", e)),
        }
    }

    /// Create, or update when a record is being edited.
    pub async fn submit(&self, form: &FormFields) -> Result<T, ResourceError> {
        if self.editing_id().is_some() {
            self.update(form).await
        } else {
            self.create(form).await
        }
    }

    pub async fn delete(&self, id: i64, prompt: &dyn Prompt) -> Result<(), ResourceError> {
        let question = format!(
            "Are you sure you want to delete this {}?",
            T::KIND.label().to_lowercase()
        );
        if !prompt.confirm(&question) {
            return Err(ResourceError::Cancelled);
        }
        match self.primary.delete(id).await {
            Ok(()) => {
                self.notifier
                    .success(format!("{} deleted successfully!", T::KIND.label()));
                self.reload().await;
                Ok(())
            }
            Err(e) => Err(self.report_failure("deleting", e)),
        }
    }

    /// Primary listing, or the mirror when the primary fails. The flag is
    /// true when the mirror answered.
    async fn fetch(&self) -> Result<(Vec<T>, bool), RepositoryError> {
        match self.primary.list().await {
            Ok(items) => {
                if let Some(mirror) = &self.mirror {
                    if let Err(e) = mirror.replace_all(&items).await {
                        tracing::warn!(kind = %T::KIND, error = %e, "Failed to refresh local mirror");
                    }
                }
                Ok((items, false))
            }
            // Stale data must not hide an ended session.
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => match &self.mirror {
                Some(mirror) => {
                    tracing::warn!(kind = %T::KIND, error = %e, "Falling back to local store");
                    Ok((mirror.list().await?, true))
                }
                None => Err(e),
            },
        }
    }

    fn parse(&self, form: &FormFields) -> Result<T, ResourceError> {
        T::from_form(form).map_err(|e| {
            self.notifier.error(e.to_string());
            ResourceError::Validation(e)
        })
    }

    pub(crate) async fn reload(&self) {
        if let Err(e) = self.list().await {
            tracing::warn!(kind = %T::KIND, error = %e, "Reload after change failed");
        }
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub(crate) fn report_failure(&self, action: &str, err: RepositoryError) -> ResourceError {
        tracing::error!(kind = %T::KIND, action = action, error = %err, "Repository call failed");
        self.announce(&err, || {
            format!(
                "Error {} {}. Please try again.",
                action,
                T::KIND.label().to_lowercase()
            )
        });
        ResourceError::Repository(err)
    }

    /// Error banner for `err`: the login prompt when the session ended,
    /// `message` otherwise.
    fn announce(&self, err: &RepositoryError, message: impl FnOnce() -> String) {
        if err.is_auth_failure() {
            self.notifier.error(err.to_string());
        } else {
            self.notifier.error(message());
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::domain::Faq;
    use crate::notify::NotificationKind;
    use crate::repository::RepoResult;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Repository whose every call fails, counting attempts.
    #[derive(Default)]
    struct Offline {
        calls: AtomicUsize,
    }

    impl Offline {
        fn fail<V>(&self) -> RepoResult<V> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Store(anyhow::anyhow!("offline")))
        }
    }

    #[async_trait]
    impl Repository<Faq> for Offline {
        async fn list(&self) -> RepoResult<Vec<Faq>> {
            self.fail()
        }
        async fn find_by_id(&self, _id: i64) -> RepoResult<Option<Faq>> {
            self.fail()
        }
        async fn create(&self, _item: &Faq) -> RepoResult<Faq> {
            self.fail()
        }
        async fn update(&self, _id: i64, _item: &Faq) -> RepoResult<Faq> {
            self.fail()
        }
        async fn delete(&self, _id: i64) -> RepoResult<()> {
            self.fail()
        }
    }

    /// Repository answering as a server that rejected our tokens.
    struct SessionEnded;

    #[async_trait]
    impl Repository<Faq> for SessionEnded {
        async fn list(&self) -> RepoResult<Vec<Faq>> {
            Err(ApiError::AuthenticationFailed.into())
        }
        async fn find_by_id(&self, _id: i64) -> RepoResult<Option<Faq>> {
            Err(ApiError::AuthenticationFailed.into())
        }
        async fn create(&self, _item: &Faq) -> RepoResult<Faq> {
            Err(ApiError::AuthenticationFailed.into())
        }
        async fn update(&self, _id: i64, _item: &Faq) -> RepoResult<Faq> {
            Err(ApiError::AuthenticationFailed.into())
        }
        async fn delete(&self, _id: i64) -> RepoResult<()> {
            Err(ApiError::AuthenticationFailed.into())
        }
    }

    fn faq_form(question: &str) -> FormFields {
        FormFields::new()
            .with("question", question)
            .with("category", "loans")
            .with("answer", "Up to three times your savings.")
    }

    fn local_controller() -> (ResourceController<Faq>, Notifier) {
        let notifier = Notifier::new(Duration::from_secs(5));
        let repo = LocalRepository::<Faq>::new(Arc::new(MemoryStore::new()));
        (
            ResourceController::new(Arc::new(repo), None, notifier.clone()),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_create_relists_view() {
        let (controller, notifier) = local_controller();
        let created = controller.create(&faq_form("How much can I borrow?")).await.unwrap();

        assert_eq!(created.id, Some(1));
        assert_eq!(controller.rows(), vec![created]);
        let banners = notifier.active();
        assert_eq!(banners.last().unwrap().message, "FAQ saved successfully!");
    }

    #[tokio::test]
    async fn test_validation_error_skips_repository() {
        let notifier = Notifier::new(Duration::from_secs(5));
        let offline = Arc::new(Offline::default());
        let controller = ResourceController::new(offline.clone(), None, notifier.clone());

        let form = FormFields::new().with("question", "Where?").with("category", "general");
        let err = controller.create(&form).await.unwrap_err();

        assert!(matches!(
            err,
            ResourceError::Validation(ValidationError::MissingField("Answer"))
        ));
        assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.active()[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_view() {
        let (controller, _) = local_controller();
        controller.create(&faq_form("First")).await.unwrap();
        let before = controller.rows();

        let notifier = Notifier::new(Duration::from_secs(5));
        let broken = ResourceController::new(Arc::new(Offline::default()), None, notifier.clone());
        *lock(&broken.rows) = before.clone();

        assert!(broken.create(&faq_form("Second")).await.is_err());
        assert_eq!(broken.rows(), before);
        assert_eq!(
            notifier.active()[0].message,
            "Error saving faq. Please try again."
        );
    }

    #[tokio::test]
    async fn test_update_requires_edit_mode() {
        let (controller, _) = local_controller();
        let err = controller.update(&faq_form("Anything")).await.unwrap_err();
        assert!(matches!(err, ResourceError::NotEditing { .. }));
    }

    #[tokio::test]
    async fn test_submit_switches_on_edit_mode() {
        let (controller, _) = local_controller();
        controller.submit(&faq_form("Original")).await.unwrap();

        let loaded = controller.begin_edit(1).await.unwrap();
        assert_eq!(controller.editing_id(), Some(1));

        let form = loaded.to_form().with("question", "Edited");
        let updated = controller.submit(&form).await.unwrap();

        assert_eq!(updated.id, Some(1));
        assert_eq!(controller.editing_id(), None);
        let questions: Vec<_> = controller.rows().into_iter().map(|f| f.question).collect();
        assert_eq!(questions, vec!["Edited"]);
    }

    #[tokio::test]
    async fn test_cancel_edit_returns_to_create() {
        let (controller, _) = local_controller();
        controller.create(&faq_form("One")).await.unwrap();
        controller.begin_edit(1).await.unwrap();
        controller.cancel_edit();

        controller.submit(&faq_form("Two")).await.unwrap();
        assert_eq!(controller.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_begin_edit_missing_record() {
        let (controller, _) = local_controller();
        assert!(matches!(
            controller.begin_edit(9).await,
            Err(ResourceError::NotFound { id: 9, .. })
        ));
        assert_eq!(controller.editing_id(), None);
    }

    #[tokio::test]
    async fn test_declined_delete_is_noop() {
        let (controller, _) = local_controller();
        controller.create(&faq_form("Keep me")).await.unwrap();

        let decline = |_: &str| false;
        assert!(matches!(
            controller.delete(1, &decline).await,
            Err(ResourceError::Cancelled)
        ));
        assert_eq!(controller.list().await.unwrap().len(), 1);

        let accept = |message: &str| message.contains("delete this faq");
        controller.delete(1, &accept).await.unwrap();
        assert!(controller.rows().is_empty());
    }

    #[tokio::test]
    async fn test_list_falls_back_to_mirror() {
        let store = Arc::new(MemoryStore::new());
        let mirror = LocalRepository::<Faq>::new(store.clone());
        mirror
            .create(&Faq::from_form(&faq_form("Cached")).unwrap())
            .await
            .unwrap();

        let notifier = Notifier::new(Duration::from_secs(5));
        let controller = ResourceController::new(
            Arc::new(Offline::default()),
            Some(LocalRepository::new(store)),
            notifier.clone(),
        );

        let items = controller.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(notifier.active()[0].kind, NotificationKind::Warning);
    }

    #[tokio::test]
    async fn test_list_without_mirror_reports_error() {
        let notifier = Notifier::new(Duration::from_secs(5));
        let controller: ResourceController<Faq> =
            ResourceController::new(Arc::new(Offline::default()), None, notifier.clone());
        assert!(controller.list().await.is_err());
        assert_eq!(notifier.active()[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_auth_failure_skips_mirror() {
        let store = Arc::new(MemoryStore::new());
        LocalRepository::<Faq>::new(store.clone())
            .create(&Faq::from_form(&faq_form("Cached")).unwrap())
            .await
            .unwrap();

        let notifier = Notifier::new(Duration::from_secs(5));
        let controller = ResourceController::new(
            Arc::new(SessionEnded),
            Some(LocalRepository::new(store)),
            notifier.clone(),
        );

        let err = controller.list().await.unwrap_err();
        assert!(err.is_auth_failure());
        assert!(controller.rows().is_empty());

        let banners = notifier.active();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].kind, NotificationKind::Error);
        assert_eq!(banners[0].message, "Authentication failed. Please login again.");
    }

    #[tokio::test]
    async fn test_auth_failure_on_delete_asks_for_login() {
        let notifier = Notifier::new(Duration::from_secs(5));
        let controller = ResourceController::new(Arc::new(SessionEnded), None, notifier.clone());

        let yes = |_: &str| true;
        let err = controller.delete(4, &yes).await.unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(
            notifier.active()[0].message,
            "Authentication failed. Please login again."
        );
    }

    #[test]
    fn test_offline_is_not_auth_failure() {
        let err = ResourceError::Repository(RepositoryError::Store(anyhow::anyhow!("offline")));
        assert!(!err.is_auth_failure());
        assert!(ResourceError::Repository(ApiError::AuthenticationFailed.into()).is_auth_failure());
    }
}

use chrono::Utc;
use std::sync::Arc;

use super::controller::{Prompt, ResourceController, ResourceError};
use crate::api::{ApiClient, ApiError};
use crate::domain::{Feedback, FeedbackStatus};
use crate::repository::{LocalRepository, RepoResult, Repository};
use crate::storage::KeyValueStore;
use crate::util::{require, ValidationError};

/// Reply shown to the visitor once the contact form is accepted.
pub const THANK_YOU: &str = "Thank you for your feedback! We will get back to you soon.";

/// Messages that could not reach the server, waiting to be resent.
const OUTBOX_KEY: &str = "content.feedback.outbox";

/// Where public contact submissions go.
enum Intake {
    /// Public submit endpoint, with a local outbox for failed sends.
    Remote {
        api: ApiClient,
        outbox: LocalRepository<Feedback>,
    },
    Local(LocalRepository<Feedback>),
}

/// Public contact form plus the admin's feedback inbox.
pub struct FeedbackDesk {
    controller: Arc<ResourceController<Feedback>>,
    intake: Intake,
}

impl FeedbackDesk {
    /// Submissions go straight into the local feedback list.
    pub fn local(controller: Arc<ResourceController<Feedback>>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            controller,
            intake: Intake::Local(LocalRepository::new(store)),
        }
    }

    /// Submissions go to the public API; failures wait in a local outbox.
    pub fn remote(
        controller: Arc<ResourceController<Feedback>>,
        api: ApiClient,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            controller,
            intake: Intake::Remote {
                api,
                outbox: LocalRepository::with_key(store, OUTBOX_KEY),
            },
        }
    }

    pub fn controller(&self) -> &Arc<ResourceController<Feedback>> {
        &self.controller
    }

    /// Accept a contact-form message.
    ///
    /// Only validation fails; once the message is well-formed the visitor
    /// always gets [`THANK_YOU`], whatever happens to the delivery.
    pub async fn submit_contact(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<&'static str, ValidationError> {
        let feedback = Feedback::new(name, email, message, Utc::now())?;

        match &self.intake {
            Intake::Local(repo) => {
                if let Err(e) = repo.create(&feedback).await {
                    tracing::error!(error = %e, "Failed to store feedback locally");
                }
            }
            Intake::Remote { api, outbox } => {
                if let Err(e) = api.submit_feedback(&feedback).await {
                    tracing::warn!(error = %e, "Feedback submission failed, keeping it locally");
                    if let Err(e) = outbox.create(&feedback).await {
                        tracing::error!(error = %e, "Failed to store feedback locally");
                    }
                }
            }
        }
        Ok(THANK_YOU)
    }

    /// Resend messages left in the outbox. Returns how many went through.
    pub async fn flush_outbox(&self) -> usize {
        let Intake::Remote { api, outbox } = &self.intake else {
            return 0;
        };
        let pending = match outbox.list().await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read feedback outbox");
                return 0;
            }
        };

        let mut sent = 0;
        for feedback in pending {
            let Some(id) = feedback.id else { continue };
            if let Err(e) = api.submit_feedback(&feedback).await {
                tracing::debug!(error = %e, "Outbox still undeliverable");
                break;
            }
            if let Err(e) = outbox.delete(id).await {
                tracing::warn!(id = id, error = %e, "Failed to drop delivered feedback from outbox");
            }
            sent += 1;
        }
        if sent > 0 {
            tracing::info!(sent = sent, "Delivered queued feedback");
        }
        sent
    }

    /// Messages waiting in the outbox.
    pub async fn pending(&self) -> usize {
        match &self.intake {
            Intake::Remote { outbox, .. } => outbox.list().await.map(|p| p.len()).unwrap_or(0),
            Intake::Local(_) => 0,
        }
    }

    /// All feedback, newest first.
    pub async fn inbox(&self) -> Result<Vec<Feedback>, ResourceError> {
        self.flush_outbox().await;
        let mut items = self.controller.list().await?;
        items.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(items)
    }

    /// Open a message, marking it read. `None` when the id does not exist.
    pub async fn view(&self, id: i64) -> Result<Option<Feedback>, ResourceError> {
        let repo = self.controller.repository();
        let Some(mut feedback) = repo.find_by_id(id).await? else {
            tracing::debug!(id = id, "Feedback not found");
            return Ok(None);
        };

        if feedback.is_unread() {
            feedback.status = FeedbackStatus::Read;
            feedback = repo.update(id, &feedback).await?;
            self.controller.list().await?;
        }
        Ok(Some(feedback))
    }

    pub async fn unread_count(&self) -> Result<usize, ResourceError> {
        let items = self.controller.repository().list().await?;
        Ok(items.iter().filter(|f| f.is_unread()).count())
    }

    /// Answer message `id`. `None` when the id does not exist.
    pub async fn reply(&self, id: i64, text: &str) -> Result<Option<Feedback>, ResourceError> {
        let text = require("Reply", text).map_err(|e| {
            self.controller.notifier().error(e.to_string());
            ResourceError::Validation(e)
        })?;

        let outcome = match &self.intake {
            Intake::Remote { api, .. } => self.reply_remote(api, id, text).await,
            Intake::Local(_) => self.reply_local(id, text).await,
        };
        match outcome {
            Ok(Some(feedback)) => {
                self.controller.notifier().success("Reply sent successfully!");
                self.controller.reload().await;
                Ok(Some(feedback))
            }
            Ok(None) => {
                tracing::debug!(id = id, "Feedback not found");
                Ok(None)
            }
            Err(e) => Err(self.controller.report_failure("replying to", e)),
        }
    }

    async fn reply_remote(
        &self,
        api: &ApiClient,
        id: i64,
        text: &str,
    ) -> RepoResult<Option<Feedback>> {
        match api.respond_feedback(id, text).await {
            Ok(()) => {}
            Err(ApiError::Http { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        self.controller.repository().find_by_id(id).await
    }

    async fn reply_local(&self, id: i64, text: &str) -> RepoResult<Option<Feedback>> {
        let repo = self.controller.repository();
        let Some(mut feedback) = repo.find_by_id(id).await? else {
            return Ok(None);
        };
        feedback.record_reply(text, Utc::now());
        repo.update(id, &feedback).await.map(Some)
    }

    pub async fn delete(&self, id: i64, prompt: &dyn Prompt) -> Result<(), ResourceError> {
        self.controller.delete(id, prompt).await
    }
}

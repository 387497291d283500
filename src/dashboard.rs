//! Dashboard: content counts per kind plus unread feedback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::domain::ResourceKind;
use crate::resource::{FeedbackDesk, HandlerRegistry, ResourceError};

/// Source of the unread-feedback figure.
#[async_trait]
pub trait UnreadCounter: Send + Sync {
    async fn unread_count(&self) -> Result<usize, ResourceError>;
}

#[async_trait]
impl UnreadCounter for FeedbackDesk {
    async fn unread_count(&self) -> Result<usize, ResourceError> {
        FeedbackDesk::unread_count(self).await
    }
}

/// One dashboard snapshot. `None` marks a figure that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub totals: BTreeMap<ResourceKind, Option<usize>>,
    pub unread_feedback: Option<usize>,
    pub refreshed_at: DateTime<Utc>,
}

pub struct Dashboard {
    registry: Arc<HandlerRegistry>,
    unread: Arc<dyn UnreadCounter>,
    latest: Mutex<Option<DashboardSummary>>,
}

impl Dashboard {
    pub fn new(registry: Arc<HandlerRegistry>, unread: Arc<dyn UnreadCounter>) -> Self {
        Self {
            registry,
            unread,
            latest: Mutex::new(None),
        }
    }

    /// Recount everything concurrently. A failed count never blocks the rest.
    pub async fn refresh(&self) -> DashboardSummary {
        let kinds = self.registry.kinds();
        let counts = kinds.iter().filter_map(|kind| {
            let handler = self.registry.get(*kind)?.clone();
            let kind = *kind;
            Some(async move {
                let count = match handler.count().await {
                    Ok(n) => Some(n),
                    Err(e) => {
                        tracing::warn!(kind = %kind, error = %e, "Dashboard count failed");
                        None
                    }
                };
                (kind, count)
            })
        });

        let (totals, unread) = futures::join!(join_all(counts), self.unread.unread_count());
        let unread_feedback = match unread {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!(error = %e, "Unread feedback count failed");
                None
            }
        };

        let summary = DashboardSummary {
            totals: totals.into_iter().collect(),
            unread_feedback,
            refreshed_at: Utc::now(),
        };
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(summary.clone());
        summary
    }

    /// The last snapshot from [`refresh`](Self::refresh), if any.
    pub fn latest(&self) -> Option<DashboardSummary> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

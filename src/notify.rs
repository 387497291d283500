//! Transient status banners.
//!
//! Banners stack in the order shown and disappear on their own after the
//! configured timeout. Every banner is also a `tracing` event.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    shown_at: Instant,
}

#[derive(Default)]
struct Banners {
    next_id: u64,
    visible: Vec<Banner>,
}

/// Shared handle to the banner stack. Clones see the same banners.
#[derive(Clone)]
pub struct Notifier {
    banners: Arc<Mutex<Banners>>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Self {
        Self {
            banners: Arc::new(Mutex::new(Banners::default())),
            timeout,
        }
    }

    /// Push a banner and return its id.
    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let message = message.into();
        match kind {
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(kind = %kind, "{}", message)
            }
            NotificationKind::Warning => tracing::warn!(kind = %kind, "{}", message),
            NotificationKind::Error => tracing::error!(kind = %kind, "{}", message),
        }

        let mut banners = self.lock();
        banners.next_id += 1;
        let id = banners.next_id;
        banners.visible.push(Banner {
            id,
            kind,
            message,
            shown_at: Instant::now(),
        });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Info)
    }

    /// Remove a banner before it expires. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut banners = self.lock();
        let before = banners.visible.len();
        banners.visible.retain(|b| b.id != id);
        banners.visible.len() != before
    }

    /// Banners still on screen, oldest first.
    pub fn active(&self) -> Vec<Banner> {
        let timeout = self.timeout;
        let mut banners = self.lock();
        banners
            .visible
            .retain(|b| b.shown_at.elapsed() < timeout);
        banners.visible.clone()
    }

    /// Take every banner not yet dismissed, expired or not, leaving the
    /// stack empty. For front-ends that print once a command finishes.
    pub fn drain(&self) -> Vec<Banner> {
        std::mem::take(&mut self.lock().visible)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Banners> {
        // A panic while holding the lock leaves the banner list intact.
        self.banners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Toast store: transient user-facing notifications.
//!
//! DESIGN
//! ======
//! One `ToastStore` is created at startup and injected through `AppState`.
//! Toasts are scoped to a channel (one per browser, from the flash cookie)
//! and kept in arrival order. `add`, `dismiss`, and timer-driven expiry all
//! serialize on a single mutex; the lock is never held across an `.await`.
//! Every mutation bumps a version published on a `watch` channel so
//! subscribers can re-read the snapshot.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

pub type ToastId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Default,
    Destructive,
    Success,
}

/// A queued notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    #[serde(skip)]
    pub channel: String,
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
    /// Lifetime from insertion, in milliseconds.
    pub duration_ms: u64,
}

/// Caller-supplied toast content.
#[derive(Debug, Clone)]
pub struct NewToast {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
    /// Overrides the store default when set.
    pub duration: Option<Duration>,
}

impl NewToast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_variant(ToastVariant::Success, title, description)
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_variant(ToastVariant::Destructive, title, description)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_variant(ToastVariant::Default, title, description)
    }

    fn with_variant(variant: ToastVariant, title: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            title: title.into(),
            description: (!description.is_empty()).then_some(description),
            variant,
            duration: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastConfig {
    /// Maximum toasts per channel; the oldest is evicted beyond this.
    pub limit: usize,
    pub duration: Duration,
}

#[derive(Default)]
struct ToastQueue {
    next_id: ToastId,
    version: u64,
    toasts: VecDeque<Toast>,
}

impl ToastQueue {
    fn remove(&mut self, id: ToastId) -> bool {
        let Some(pos) = self.toasts.iter().position(|t| t.id == id) else {
            return false;
        };
        self.toasts.remove(pos);
        self.version += 1;
        true
    }
}

#[derive(Clone)]
pub struct ToastStore {
    inner: Arc<Mutex<ToastQueue>>,
    notify: Arc<watch::Sender<u64>>,
    config: ToastConfig,
}

/// Returned by [`ToastStore::add`]; dismisses the toast it was issued for.
#[derive(Clone)]
pub struct ToastHandle {
    id: ToastId,
    store: ToastStore,
}

impl ToastHandle {
    #[must_use]
    pub fn id(&self) -> ToastId {
        self.id
    }

    /// Dismiss this toast. Returns `false` when it was already gone.
    pub fn dismiss(&self) -> bool {
        self.store.dismiss(self.id)
    }
}

impl ToastStore {
    #[must_use]
    pub fn new(config: ToastConfig) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { inner: Arc::new(Mutex::new(ToastQueue::default())), notify: Arc::new(tx), config }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ToastQueue> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, version: u64) {
        self.notify.send_replace(version);
    }

    /// Queue a toast on `channel` and schedule its expiry.
    pub fn add(&self, channel: &str, toast: NewToast) -> ToastHandle {
        let duration = toast.duration.unwrap_or(self.config.duration);
        let (id, version) = {
            let mut queue = self.lock();
            queue.next_id += 1;
            let id = queue.next_id;

            let in_channel = queue.toasts.iter().filter(|t| t.channel == channel).count();
            if in_channel >= self.config.limit {
                if let Some(pos) = queue.toasts.iter().position(|t| t.channel == channel) {
                    queue.toasts.remove(pos);
                }
            }

            queue.toasts.push_back(Toast {
                id,
                channel: channel.to_owned(),
                title: toast.title,
                description: toast.description,
                variant: toast.variant,
                duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            });
            queue.version += 1;
            (id, queue.version)
        };
        self.publish(version);
        self.schedule_expiry(id, duration);
        ToastHandle { id, store: self.clone() }
    }

    fn schedule_expiry(&self, id: ToastId, duration: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(toast_id = id, "no runtime; toast will not auto-expire");
            return;
        };
        let store = self.clone();
        runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if store.dismiss(id) {
                tracing::debug!(toast_id = id, "toast expired");
            }
        });
    }

    /// Remove a toast. Idempotent: unknown or already removed ids are a no-op.
    pub fn dismiss(&self, id: ToastId) -> bool {
        let version = {
            let mut queue = self.lock();
            if !queue.remove(id) {
                return false;
            }
            queue.version
        };
        self.publish(version);
        true
    }

    /// Dismiss a toast only if it belongs to `channel`.
    pub fn dismiss_in(&self, channel: &str, id: ToastId) -> bool {
        let version = {
            let mut queue = self.lock();
            if !queue.toasts.iter().any(|t| t.id == id && t.channel == channel) {
                return false;
            }
            queue.remove(id);
            queue.version
        };
        self.publish(version);
        true
    }

    /// Current toasts for `channel`, oldest first.
    #[must_use]
    pub fn snapshot(&self, channel: &str) -> Vec<Toast> {
        self.lock()
            .toasts
            .iter()
            .filter(|t| t.channel == channel)
            .cloned()
            .collect()
    }

    /// Receiver that observes a new version after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }
}

#[cfg(test)]
#[path = "toast_test.rs"]
mod tests;

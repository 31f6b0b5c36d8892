//! Foreground push notification listener.
//!
//! Push messages arrive on a persistent channel. Each one raises a native
//! notification (when permitted), shows an in-app toast that dismisses
//! itself, and wakes the view's data refresh.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::scheduler::RefreshTrigger;

const DEFAULT_TITLE: &str = "Memoraid";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushNotification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Payload delivered by the push service: `{notification: {title, body}, data}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(default)]
    pub notification: Option<PushNotification>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            notification: Some(PushNotification {
                title: title.into(),
                body: body.into(),
            }),
            data: HashMap::new(),
        }
    }

    fn title_and_body(&self) -> (String, String) {
        match &self.notification {
            Some(n) if !n.title.is_empty() => (n.title.clone(), n.body.clone()),
            Some(n) => (DEFAULT_TITLE.to_string(), n.body.clone()),
            None => (
                self.data
                    .get("title")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                self.data.get("body").cloned().unwrap_or_default(),
            ),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PushError {
    #[error("Push channel error: {0}")]
    Channel(String),
}

pub type PushSender = mpsc::Sender<Result<PushMessage, PushError>>;
pub type PushStream = mpsc::Receiver<Result<PushMessage, PushError>>;

/// Subscription the push integration feeds and the listener consumes.
pub fn push_channel(capacity: usize) -> (PushSender, PushStream) {
    mpsc::channel(capacity)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    Default,
}

/// Native notification surface of the host platform.
pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;

    fn show(&self, title: &str, body: &str);
}

/// Platform without native notifications.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn show(&self, _title: &str, _body: &str) {}
}

/// In-app toast. `id` grows with every message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub title: String,
    pub body: String,
}

pub struct NotificationListener<N> {
    notifier: Arc<N>,
    toast: Arc<watch::Sender<Option<Toast>>>,
    dismiss_after: Duration,
    refresh: RefreshTrigger,
    generation: AtomicU64,
}

impl<N: Notifier + 'static> NotificationListener<N> {
    pub fn new(notifier: Arc<N>, dismiss_after: Duration, refresh: RefreshTrigger) -> Self {
        let (toast, _) = watch::channel(None);
        Self {
            notifier,
            toast: Arc::new(toast),
            dismiss_after,
            refresh,
            generation: AtomicU64::new(0),
        }
    }

    /// Current toast, updated as messages arrive and expire.
    pub fn toasts(&self) -> watch::Receiver<Option<Toast>> {
        self.toast.subscribe()
    }

    /// Close the toast now (the user tapped it away).
    pub fn dismiss(&self) {
        self.toast.send_replace(None);
    }

    /// Consume the stream until every sender is gone.
    pub async fn run(&self, mut stream: PushStream) {
        tracing::info!("Notification listener started");
        while let Some(item) = stream.recv().await {
            match item {
                Ok(message) => self.handle(message),
                Err(e) => tracing::warn!(error = %e, "Push subscription error"),
            }
        }
        tracing::info!("Notification listener stopped");
    }

    /// Run the listener on its own task.
    pub fn spawn(self: Arc<Self>, stream: PushStream) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(stream).await })
    }

    fn handle(&self, message: PushMessage) {
        let (title, body) = message.title_and_body();
        tracing::info!(title = %title, "Foreground notification received");

        if self.notifier.permission() == NotificationPermission::Granted {
            self.notifier.show(&title, &body);
        }

        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.toast.send_replace(Some(Toast { id, title, body }));
        self.schedule_dismiss(id);

        self.refresh.fire();
    }

    fn schedule_dismiss(&self, id: u64) {
        let toast = Arc::clone(&self.toast);
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A newer toast owns its own timer.
            toast.send_if_modified(|current| {
                if current.as_ref().is_some_and(|t| t.id == id) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_falls_back_to_data() {
        let message: PushMessage = serde_json::from_value(serde_json::json!({
            "data": {"title": "Missed task", "body": "Lunch at 1:05 PM"}
        }))
        .unwrap();
        assert_eq!(
            message.title_and_body(),
            ("Missed task".to_string(), "Lunch at 1:05 PM".to_string())
        );

        let empty = PushMessage::default();
        assert_eq!(empty.title_and_body().0, DEFAULT_TITLE);
    }
}

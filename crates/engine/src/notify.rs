//! Notification sink for user-facing messages.
//!
//! The engine calls [`Notifier::notify`] on run state transitions. The UI
//! decides what a notification looks like; the core only emits data.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str, details: Option<&Value>);
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _level: NotifyLevel, _message: &str, _details: Option<&Value>) {}
}

/// Forwards notifications to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, details: Option<&Value>) {
        let details = details.map(Value::to_string).unwrap_or_default();
        match level {
            NotifyLevel::Info | NotifyLevel::Success => info!(?level, %details, "{message}"),
            NotifyLevel::Warning => warn!(%details, "{message}"),
            NotifyLevel::Error => error!(%details, "{message}"),
        }
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotifyLevel,
    pub message: String,
    pub details: Option<Value>,
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn levels(&self) -> Vec<NotifyLevel> {
        self.notifications().iter().map(|n| n.level).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, details: Option<&Value>) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Notification {
                level,
                message: message.to_owned(),
                details: details.cloned(),
            });
    }
}

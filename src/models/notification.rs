use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Optional call-to-action attached to a notification.
///
/// `command` is an opaque identifier the view maps back to an intent
/// (e.g. `"open-token:pepe-6"`); the queue never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub command: String,
}

/// A notification before it enters the queue: no id, timestamp or read flag yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub action: Option<NotificationAction>,
}

impl NewNotification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            action: None,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn with_action(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.action = Some(NotificationAction {
            label: label.into(),
            command: command.into(),
        });
        self
    }
}

/// Transient UI event held in the notification queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub action: Option<NotificationAction>,
}

impl Notification {
    /// Stamps a pending notification with its queue id and creation time.
    pub fn from_new(new: NewNotification, id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            timestamp,
            read: false,
            action: new.action,
        }
    }
}

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::models::{NewNotification, Notification};

/// Default number of notifications kept in the queue.
pub const DEFAULT_NOTIFICATION_CAP: usize = 10;

/// Bounded, most-recent-first list of transient UI events.
///
/// Independent of the token store. Every mutation publishes the new list to
/// subscribers.
pub struct NotificationQueue {
    items: Vec<Notification>,
    cap: usize,
    tx: watch::Sender<Arc<Vec<Notification>>>,
}

impl NotificationQueue {
    pub fn new(cap: usize) -> Self {
        let (tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            items: Vec::new(),
            cap: cap.max(1),
            tx,
        }
    }

    /// Assigns a fresh id and timestamp, inserts at the front and evicts the
    /// oldest entries beyond the cap. Returns the new id.
    pub fn push(&mut self, new: NewNotification) -> String {
        let id = Uuid::new_v4().to_string();
        let notification = Notification::from_new(new, id.clone(), Utc::now());

        self.items.insert(0, notification);
        self.items.truncate(self.cap);

        self.publish();
        id
    }

    /// Unknown ids are ignored. Returns true if a notification changed.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(notification) if !notification.read => {
                notification.read = true;
                self.publish();
                true
            },
            _ => false,
        }
    }

    /// Unknown ids are ignored. Returns true if a notification was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);

        if self.items.len() == before {
            return false;
        }
        self.publish();
        true
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
        self.publish();
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    /// Read-only subscription; the receiver always sees the latest list.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Notification>>> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        self.tx.send_replace(Arc::new(self.items.clone()));
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAP)
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

// Notification Bus - per-user push over a tokio broadcast channel
//
// Every open notification stream holds a receiver filtered to one user.
// Publishing is a non-blocking broadcast send. A per-user subscriber count
// lets the dispatcher report when the recipient has no open stream, in which
// case the notification is dropped.
//
// In-memory only: notifications are not persisted or replayed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::notification::{NotificationDispatcher, NotificationError, UserNotification};
use crate::domain::user::UserId;

type SubscriberCounts = Arc<Mutex<HashMap<UserId, usize>>>;

#[derive(Clone)]
pub struct NotificationBus {
    sender: Arc<broadcast::Sender<UserNotification>>,
    subscribers: SubscriberCounts,
}

impl NotificationBus {
    /// Capacity bounds how far a slow stream may fall behind before it
    /// starts losing notifications.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(1024)
    }

    /// Publish to every open stream of the recipient.
    pub fn publish(&self, notification: UserNotification) -> Result<(), NotificationError> {
        let recipient = notification.recipient;
        if self.subscriber_count(recipient) == 0 {
            debug!(user_id = %recipient, code = %notification.code, "No open notification stream");
            return Err(NotificationError::NoSubscriber(recipient));
        }

        debug!(user_id = %recipient, code = %notification.code, "Publishing notification");
        self.sender
            .send(notification)
            .map(|_| ())
            .map_err(|_| NotificationError::NoSubscriber(recipient))
    }

    /// Open a stream of notifications addressed to `user_id`.
    pub fn subscribe_user(&self, user_id: UserId) -> UserNotificationReceiver {
        *self.subscribers.lock().entry(user_id).or_insert(0) += 1;
        UserNotificationReceiver {
            receiver: self.sender.subscribe(),
            user_id,
            subscribers: self.subscribers.clone(),
        }
    }

    pub fn subscriber_count(&self, user_id: UserId) -> usize {
        self.subscribers.lock().get(&user_id).copied().unwrap_or(0)
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl NotificationDispatcher for NotificationBus {
    async fn dispatch(&self, notification: UserNotification) -> Result<(), NotificationError> {
        self.publish(notification)
    }
}

/// Receiver filtered to a single user's notifications.
pub struct UserNotificationReceiver {
    receiver: broadcast::Receiver<UserNotification>,
    user_id: UserId,
    subscribers: SubscriberCounts,
}

impl UserNotificationReceiver {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Wait for the next notification addressed to this user.
    pub async fn recv(&mut self) -> Result<UserNotification, NotificationBusError> {
        loop {
            let notification = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => NotificationBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!(user_id = %self.user_id, "Notification receiver lagged by {} messages", n);
                    NotificationBusError::Lagged(n)
                }
            })?;

            if notification.recipient == self.user_id {
                return Ok(notification);
            }
        }
    }
}

impl Drop for UserNotificationReceiver {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.lock();
        if let Some(count) = subscribers.get_mut(&self.user_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                subscribers.remove(&self.user_id);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationBusError {
    #[error("Notification bus is closed")]
    Closed,

    #[error("Receiver lagged by {0} notifications (notifications were dropped)")]
    Lagged(u64),
}

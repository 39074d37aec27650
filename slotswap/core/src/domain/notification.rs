// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Notification Port
//!
//! Per-user push of a swap outcome code. Delivery is best-effort and
//! at-most-once: the negotiation engine dispatches after its transaction has
//! committed, logs a failure and carries on. Nothing about a swap's
//! correctness depends on a notification arriving.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCode {
    /// Sent to the responder when someone proposes a swap for their slot.
    NewRequest,
    /// Sent to the requester when the responder accepts.
    SwapAccepted,
    /// Sent to the requester when the responder rejects.
    SwapRejected,
}

impl NotificationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewRequest => "NEW_REQUEST",
            Self::SwapAccepted => "SWAP_ACCEPTED",
            Self::SwapRejected => "SWAP_REJECTED",
        }
    }
}

impl std::fmt::Display for NotificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification addressed to one user's channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotification {
    pub id: uuid::Uuid,
    pub recipient: UserId,
    pub code: NotificationCode,
    pub sent_at: DateTime<Utc>,
}

impl UserNotification {
    pub fn new(recipient: UserId, code: NotificationCode) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            recipient,
            code,
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("no open channel for user {0}")]
    NoSubscriber(UserId),

    #[error("notification channel closed")]
    Closed,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound side of the notification channel.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: UserNotification) -> Result<(), NotificationError>;
}

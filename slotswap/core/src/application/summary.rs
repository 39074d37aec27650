// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Display-safe read models returned over the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::event::{Event, EventId, EventStatus};
use crate::domain::swap::{SwapRequestId, SwapRequestView, SwapStatus};
use crate::domain::user::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: EventId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: EventStatus,
    pub user_id: UserId,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            start_time: event.start_time,
            end_time: event.end_time,
            status: event.status,
            user_id: event.owner_id,
        }
    }
}

/// Swap request as shown in incoming/outgoing lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestSummary {
    pub id: SwapRequestId,
    pub status: SwapStatus,
    pub requester_id: UserId,
    pub requester_name: String,
    pub offered_slot_title: String,
    pub desired_slot_title: String,
    pub offered_slot_start_time: DateTime<Utc>,
}

impl From<SwapRequestView> for SwapRequestSummary {
    fn from(view: SwapRequestView) -> Self {
        Self {
            id: view.request.id,
            status: view.request.status,
            requester_id: view.request.requester_id,
            requester_name: view.requester_name,
            offered_slot_title: view.offered_slot_title,
            desired_slot_title: view.desired_slot_title,
            offered_slot_start_time: view.offered_slot_start_time,
        }
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marketplace status of a calendar slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Not offered to anyone. Initial status.
    Busy,
    /// Offered to other users for exchange.
    Swappable,
    /// Locked by an outstanding swap request.
    SwapPending,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Busy => "BUSY",
            Self::Swappable => "SWAPPABLE",
            Self::SwapPending => "SWAP_PENDING",
        }
    }

    /// Whether an owner may request this status through the event store.
    /// `SWAP_PENDING` is only ever entered by the negotiation engine.
    pub fn is_owner_settable(&self) -> bool {
        matches!(self, Self::Busy | Self::Swappable)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUSY" => Ok(Self::Busy),
            "SWAPPABLE" => Ok(Self::Swappable),
            "SWAP_PENDING" => Ok(Self::SwapPending),
            other => Err(DomainError::InvalidInput(format!("unknown event status: {}", other))),
        }
    }
}

/// A titled calendar interval owned by exactly one user at any instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: EventStatus,
    pub owner_id: UserId,
}

impl Event {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Owner-initiated status change.
    ///
    /// Only `BUSY <-> SWAPPABLE` is allowed here. A slot locked by a pending
    /// swap request stays locked until the request is resolved.
    pub fn change_status(&mut self, caller: UserId, new_status: EventStatus) -> Result<(), DomainError> {
        if !self.is_owned_by(caller) {
            return Err(DomainError::forbidden("you do not own this event"));
        }
        if !new_status.is_owner_settable() {
            return Err(DomainError::invalid_state(format!(
                "status {} can only be set by a swap request",
                new_status
            )));
        }
        if self.status == EventStatus::SwapPending {
            return Err(DomainError::invalid_state(
                "event is locked by a pending swap request",
            ));
        }
        self.status = new_status;
        Ok(())
    }
}

/// Validated creation payload. New events always start `BUSY`.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub owner_id: UserId,
}

impl NewEvent {
    pub fn new(
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        owner_id: UserId,
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidInput("title cannot be empty".to_string()));
        }
        if start_time >= end_time {
            return Err(DomainError::InvalidInput(
                "start time must be before end time".to_string(),
            ));
        }
        Ok(Self {
            title: title.to_string(),
            start_time,
            end_time,
            owner_id,
        })
    }

    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            title: self.title,
            start_time: self.start_time,
            end_time: self.end_time,
            status: EventStatus::Busy,
            owner_id: self.owner_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(owner: i64, status: EventStatus) -> Event {
        let start = Utc::now();
        Event {
            id: EventId(1),
            title: "Shift".to_string(),
            start_time: start,
            end_time: start + Duration::hours(2),
            status,
            owner_id: UserId(owner),
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&EventStatus::SwapPending).unwrap(), "\"SWAP_PENDING\"");
        let parsed: EventStatus = serde_json::from_str("\"SWAPPABLE\"").unwrap();
        assert_eq!(parsed, EventStatus::Swappable);
        assert_eq!("BUSY".parse::<EventStatus>().unwrap(), EventStatus::Busy);
        assert!("busy".parse::<EventStatus>().is_err());
    }

    #[test]
    fn test_owner_can_toggle_swappable() {
        let mut e = event(7, EventStatus::Busy);
        e.change_status(UserId(7), EventStatus::Swappable).unwrap();
        assert_eq!(e.status, EventStatus::Swappable);
        e.change_status(UserId(7), EventStatus::Busy).unwrap();
        assert_eq!(e.status, EventStatus::Busy);
    }

    #[test]
    fn test_non_owner_is_forbidden_before_status_check() {
        let mut e = event(7, EventStatus::Busy);
        let err = e.change_status(UserId(8), EventStatus::SwapPending).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(e.status, EventStatus::Busy);
    }

    #[test]
    fn test_swap_pending_is_not_owner_settable() {
        let mut e = event(7, EventStatus::Swappable);
        let err = e.change_status(UserId(7), EventStatus::SwapPending).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(e.status, EventStatus::Swappable);
    }

    #[test]
    fn test_locked_event_cannot_be_released_directly() {
        let mut e = event(7, EventStatus::SwapPending);
        let err = e.change_status(UserId(7), EventStatus::Busy).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(e.status, EventStatus::SwapPending);
    }

    #[test]
    fn test_new_event_validates_interval() {
        let start = Utc::now();
        assert!(NewEvent::new("Shift", start, start, UserId(1)).is_err());
        assert!(NewEvent::new("Shift", start, start - Duration::minutes(5), UserId(1)).is_err());
        assert!(NewEvent::new("   ", start, start + Duration::hours(1), UserId(1)).is_err());

        let created = NewEvent::new(" Shift ", start, start + Duration::hours(1), UserId(1))
            .unwrap()
            .into_event(EventId(3));
        assert_eq!(created.title, "Shift");
        assert_eq!(created.status, EventStatus::Busy);
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Swap Request Aggregate
//!
//! State machine over the triple
//! `(SwapRequest.status, offered.status, desired.status)`:
//!
//! ```text
//!                propose()                  resolve(Accept)
//! (-, SWAPPABLE, SWAPPABLE) ──► (PENDING, SWAP_PENDING, SWAP_PENDING) ──► (ACCEPTED, BUSY, BUSY) + owners swapped
//!                                              │
//!                                              └── resolve(Reject) ──► (REJECTED, SWAPPABLE, SWAPPABLE)
//! ```
//!
//! The functions here are pure: they validate and mutate in-memory copies of
//! the rows. Store implementations call them while holding their transaction
//! (row locks in PostgreSQL, the writer lock in memory) and persist the
//! result only when they return `Ok`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::event::{Event, EventId, EventStatus};
use crate::domain::notification::NotificationCode;
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapRequestId(pub i64);

impl std::fmt::Display for SwapRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SwapStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(DomainError::InvalidInput(format!("unknown swap status: {}", other))),
        }
    }
}

/// Responder's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDecision {
    Accept,
    Reject,
}

impl From<bool> for SwapDecision {
    fn from(accepted: bool) -> Self {
        if accepted {
            Self::Accept
        } else {
            Self::Reject
        }
    }
}

/// A proposal to trade two specific events between their two owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub id: SwapRequestId,
    pub requester_id: UserId,
    pub responder_id: UserId,
    pub offered_slot_id: EventId,
    pub desired_slot_id: EventId,
    pub status: SwapStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated proposal awaiting an id from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSwapRequest {
    pub requester_id: UserId,
    pub responder_id: UserId,
    pub offered_slot_id: EventId,
    pub desired_slot_id: EventId,
}

impl NewSwapRequest {
    pub fn into_request(self, id: SwapRequestId, now: DateTime<Utc>) -> SwapRequest {
        SwapRequest {
            id,
            requester_id: self.requester_id,
            responder_id: self.responder_id,
            offered_slot_id: self.offered_slot_id,
            desired_slot_id: self.desired_slot_id,
            status: SwapStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validate a proposal and lock both slots.
///
/// Check order: offered ownership, offered status, desired status, then the
/// self-swap guard. On error neither event is modified.
pub fn propose(
    requester: UserId,
    offered: &mut Event,
    desired: &mut Event,
) -> Result<NewSwapRequest, DomainError> {
    if !offered.is_owned_by(requester) {
        return Err(DomainError::forbidden("you do not own the offered slot"));
    }
    if offered.status != EventStatus::Swappable {
        return Err(DomainError::invalid_state("offered slot is not swappable"));
    }
    if desired.status != EventStatus::Swappable {
        return Err(DomainError::invalid_state("desired slot is no longer available"));
    }
    if offered.id == desired.id || desired.is_owned_by(requester) {
        return Err(DomainError::invalid_state("cannot swap a slot with yourself"));
    }

    offered.status = EventStatus::SwapPending;
    desired.status = EventStatus::SwapPending;

    Ok(NewSwapRequest {
        requester_id: requester,
        responder_id: desired.owner_id,
        offered_slot_id: offered.id,
        desired_slot_id: desired.id,
    })
}

impl SwapRequest {
    pub fn is_pending(&self) -> bool {
        self.status == SwapStatus::Pending
    }

    pub fn involves(&self, event_id: EventId) -> bool {
        self.offered_slot_id == event_id || self.desired_slot_id == event_id
    }

    /// Caller-independent checks, run before the linked events are loaded.
    pub fn ensure_respondable_by(&self, responder: UserId) -> Result<(), DomainError> {
        if self.responder_id != responder {
            return Err(DomainError::forbidden("you are not the responder for this request"));
        }
        if !self.is_pending() {
            return Err(DomainError::invalid_state("this request has already been processed"));
        }
        Ok(())
    }

    /// Apply the responder's decision to the request and both linked events.
    ///
    /// Accepting transfers `offered -> responder` and `desired -> requester`
    /// and parks both slots at `BUSY`. Rejecting returns both slots to the
    /// marketplace. On error nothing is modified.
    pub fn resolve(
        &mut self,
        responder: UserId,
        decision: SwapDecision,
        offered: &mut Event,
        desired: &mut Event,
    ) -> Result<NotificationCode, DomainError> {
        self.ensure_respondable_by(responder)?;

        if offered.id != self.offered_slot_id || desired.id != self.desired_slot_id {
            return Err(DomainError::invalid_state("swap request does not reference these slots"));
        }
        if offered.status != EventStatus::SwapPending || desired.status != EventStatus::SwapPending {
            return Err(DomainError::invalid_state(
                "swap request is inconsistent with the state of its slots",
            ));
        }

        let code = match decision {
            SwapDecision::Accept => {
                self.status = SwapStatus::Accepted;
                offered.owner_id = self.responder_id;
                desired.owner_id = self.requester_id;
                offered.status = EventStatus::Busy;
                desired.status = EventStatus::Busy;
                NotificationCode::SwapAccepted
            }
            SwapDecision::Reject => {
                self.status = SwapStatus::Rejected;
                offered.status = EventStatus::Swappable;
                desired.status = EventStatus::Swappable;
                NotificationCode::SwapRejected
            }
        };
        self.updated_at = Utc::now();

        Ok(code)
    }
}

/// Request joined with the display fields a summary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequestView {
    pub request: SwapRequest,
    pub requester_name: String,
    pub offered_slot_title: String,
    pub offered_slot_start_time: DateTime<Utc>,
    pub desired_slot_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);
    const CAROL: UserId = UserId(3);

    fn slot(id: i64, owner: UserId, status: EventStatus) -> Event {
        let start = Utc::now();
        Event {
            id: EventId(id),
            title: format!("Shift{}", id),
            start_time: start,
            end_time: start + Duration::hours(1),
            status,
            owner_id: owner,
        }
    }

    fn pending_pair() -> (SwapRequest, Event, Event) {
        let mut offered = slot(1, ALICE, EventStatus::Swappable);
        let mut desired = slot(2, BOB, EventStatus::Swappable);
        let proposal = propose(ALICE, &mut offered, &mut desired).unwrap();
        (proposal.into_request(SwapRequestId(10), Utc::now()), offered, desired)
    }

    #[test]
    fn test_propose_locks_both_slots() {
        let (request, offered, desired) = pending_pair();
        assert_eq!(request.status, SwapStatus::Pending);
        assert_eq!(request.requester_id, ALICE);
        assert_eq!(request.responder_id, BOB);
        assert_eq!(offered.status, EventStatus::SwapPending);
        assert_eq!(desired.status, EventStatus::SwapPending);
    }

    #[test]
    fn test_propose_forbidden_for_non_owner_even_when_swappable() {
        let mut offered = slot(1, ALICE, EventStatus::Swappable);
        let mut desired = slot(2, BOB, EventStatus::Swappable);
        let err = propose(CAROL, &mut offered, &mut desired).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(offered.status, EventStatus::Swappable);
        assert_eq!(desired.status, EventStatus::Swappable);
    }

    #[test]
    fn test_propose_requires_both_swappable() {
        for (offered_status, desired_status) in [
            (EventStatus::Busy, EventStatus::Swappable),
            (EventStatus::SwapPending, EventStatus::Swappable),
            (EventStatus::Swappable, EventStatus::Busy),
            (EventStatus::Swappable, EventStatus::SwapPending),
        ] {
            let mut offered = slot(1, ALICE, offered_status);
            let mut desired = slot(2, BOB, desired_status);
            let err = propose(ALICE, &mut offered, &mut desired).unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
            assert_eq!(offered.status, offered_status);
            assert_eq!(desired.status, desired_status);
        }
    }

    #[test]
    fn test_propose_rejects_self_swap() {
        let mut offered = slot(1, ALICE, EventStatus::Swappable);
        let mut desired = slot(2, ALICE, EventStatus::Swappable);
        let err = propose(ALICE, &mut offered, &mut desired).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_accept_swaps_owners() {
        let (mut request, mut offered, mut desired) = pending_pair();
        let code = request
            .resolve(BOB, SwapDecision::Accept, &mut offered, &mut desired)
            .unwrap();
        assert_eq!(code, NotificationCode::SwapAccepted);
        assert_eq!(request.status, SwapStatus::Accepted);
        assert_eq!(offered.owner_id, BOB);
        assert_eq!(desired.owner_id, ALICE);
        assert_eq!(offered.status, EventStatus::Busy);
        assert_eq!(desired.status, EventStatus::Busy);
    }

    #[test]
    fn test_reject_releases_slots() {
        let (mut request, mut offered, mut desired) = pending_pair();
        let code = request
            .resolve(BOB, SwapDecision::Reject, &mut offered, &mut desired)
            .unwrap();
        assert_eq!(code, NotificationCode::SwapRejected);
        assert_eq!(request.status, SwapStatus::Rejected);
        assert_eq!(offered.owner_id, ALICE);
        assert_eq!(desired.owner_id, BOB);
        assert_eq!(offered.status, EventStatus::Swappable);
        assert_eq!(desired.status, EventStatus::Swappable);
    }

    #[test]
    fn test_only_responder_may_resolve() {
        let (mut request, mut offered, mut desired) = pending_pair();
        let err = request
            .resolve(ALICE, SwapDecision::Accept, &mut offered, &mut desired)
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert!(request.is_pending());
        assert_eq!(offered.owner_id, ALICE);
    }

    #[test]
    fn test_second_resolution_fails_without_mutation() {
        let (mut request, mut offered, mut desired) = pending_pair();
        request
            .resolve(BOB, SwapDecision::Accept, &mut offered, &mut desired)
            .unwrap();
        let (before_offered, before_desired) = (offered.clone(), desired.clone());

        let err = request
            .resolve(BOB, SwapDecision::Reject, &mut offered, &mut desired)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(request.status, SwapStatus::Accepted);
        assert_eq!(offered, before_offered);
        assert_eq!(desired, before_desired);
    }

    #[test]
    fn test_resolve_refuses_inconsistent_slots() {
        let (mut request, mut offered, mut desired) = pending_pair();
        desired.status = EventStatus::Busy;
        let err = request
            .resolve(BOB, SwapDecision::Accept, &mut offered, &mut desired)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert!(request.is_pending());
    }

    #[test]
    fn test_decision_from_bool() {
        assert_eq!(SwapDecision::from(true), SwapDecision::Accept);
        assert_eq!(SwapDecision::from(false), SwapDecision::Reject);
        assert!(SwapStatus::Accepted.is_terminal());
        assert!(!SwapStatus::Pending.is_terminal());
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Swap Negotiation Engine
//!
//! Validates and executes the two negotiation transitions:
//!
//! - **create**: the requester offers one of their `SWAPPABLE` slots for
//!   someone else's `SWAPPABLE` slot. Both slots become `SWAP_PENDING` and a
//!   `PENDING` request addressed to the desired slot's owner is stored.
//! - **respond**: that owner accepts (ownership of the two slots is
//!   exchanged, both `BUSY`) or rejects (both back to `SWAPPABLE`).
//!
//! The read-validate-write part of each transition runs inside a single
//! repository call that is atomic for the configured backend. The outcome
//! notification is dispatched only after that call has committed; dispatch
//! failures are logged and counted, never returned. Responses carry the view
//! the store read inside the same atomic call, so a concurrent transition
//! cannot leak into them.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::application::identity::IdentityResolver;
use crate::application::summary::SwapRequestSummary;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::event::EventId;
use crate::domain::notification::{
    NotificationCode, NotificationDispatcher, NotificationError, UserNotification,
};
use crate::domain::repository::SwapRequestRepository;
use crate::domain::swap::{SwapDecision, SwapRequestId, SwapStatus};
use crate::domain::user::UserId;

pub const SWAP_REQUESTS_CREATED: &str = "slotswap_swap_requests_created_total";
pub const SWAP_REQUESTS_RESOLVED: &str = "slotswap_swap_requests_resolved_total";
pub const NOTIFICATIONS_DROPPED: &str = "slotswap_notifications_dropped_total";

#[derive(Clone)]
pub struct SwapService {
    swaps: Arc<dyn SwapRequestRepository>,
    identity: IdentityResolver,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl SwapService {
    pub fn new(
        swaps: Arc<dyn SwapRequestRepository>,
        identity: IdentityResolver,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            swaps,
            identity,
            dispatcher,
        }
    }

    pub async fn create_swap_request(
        &self,
        offered_slot_id: EventId,
        desired_slot_id: EventId,
        identity: &str,
    ) -> DomainResult<SwapRequestSummary> {
        let requester = self.identity.resolve(identity).await?;

        let view = self
            .swaps
            .create_pending(requester.id, offered_slot_id, desired_slot_id)
            .await?;
        let request = &view.request;

        counter!(SWAP_REQUESTS_CREATED).increment(1);
        info!(
            request_id = %request.id,
            requester_id = %request.requester_id,
            responder_id = %request.responder_id,
            offered_slot_id = %request.offered_slot_id,
            desired_slot_id = %request.desired_slot_id,
            "Swap request created"
        );

        self.notify(request.responder_id, NotificationCode::NewRequest).await;
        Ok(SwapRequestSummary::from(view))
    }

    pub async fn respond_to_swap_request(
        &self,
        request_id: SwapRequestId,
        accepted: bool,
        identity: &str,
    ) -> DomainResult<SwapRequestSummary> {
        if self.swaps.find_by_id(request_id).await?.is_none() {
            return Err(DomainError::not_found("swap request not found"));
        }
        let responder = self.identity.resolve(identity).await?;

        let resolution = self
            .swaps
            .resolve(request_id, responder.id, SwapDecision::from(accepted))
            .await?;
        let request = &resolution.view.request;

        let outcome = match request.status {
            SwapStatus::Accepted => "accepted",
            _ => "rejected",
        };
        counter!(SWAP_REQUESTS_RESOLVED, "outcome" => outcome).increment(1);
        info!(
            request_id = %request.id,
            responder_id = %responder.id,
            outcome,
            "Swap request resolved"
        );

        self.notify(request.requester_id, resolution.code).await;
        Ok(SwapRequestSummary::from(resolution.view))
    }

    pub async fn incoming_requests(&self, identity: &str) -> DomainResult<Vec<SwapRequestSummary>> {
        let user = self.identity.resolve(identity).await?;
        let views = self.swaps.list_incoming(user.id).await?;
        debug!(user_id = %user.id, count = views.len(), "Listed incoming swap requests");
        Ok(views.into_iter().map(SwapRequestSummary::from).collect())
    }

    pub async fn outgoing_requests(&self, identity: &str) -> DomainResult<Vec<SwapRequestSummary>> {
        let user = self.identity.resolve(identity).await?;
        let views = self.swaps.list_outgoing(user.id).await?;
        debug!(user_id = %user.id, count = views.len(), "Listed outgoing swap requests");
        Ok(views.into_iter().map(SwapRequestSummary::from).collect())
    }

    /// Best-effort, at-most-once. Never fails the caller.
    async fn notify(&self, recipient: UserId, code: NotificationCode) {
        match self
            .dispatcher
            .dispatch(UserNotification::new(recipient, code))
            .await
        {
            Ok(()) => debug!(user_id = %recipient, %code, "Notification dispatched"),
            Err(NotificationError::NoSubscriber(_)) => {
                counter!(NOTIFICATIONS_DROPPED, "reason" => "no_subscriber").increment(1);
                debug!(user_id = %recipient, %code, "Recipient offline, notification dropped");
            }
            Err(e) => {
                counter!(NOTIFICATIONS_DROPPED, "reason" => "error").increment(1);
                warn!(user_id = %recipient, %code, error = %e, "Failed to dispatch notification");
            }
        }
    }
}

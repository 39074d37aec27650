// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Event Application Service
//!
//! Calendar slot operations on behalf of an authenticated caller. Slots
//! only enter or leave `SWAP_PENDING` through the swap negotiation engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::application::identity::IdentityResolver;
use crate::domain::error::DomainResult;
use crate::domain::event::{Event, EventId, EventStatus, NewEvent};
use crate::domain::repository::EventRepository;

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventRepository>,
    identity: IdentityResolver,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>, identity: IdentityResolver) -> Self {
        Self { events, identity }
    }

    pub async fn list_my_events(&self, identity: &str) -> DomainResult<Vec<Event>> {
        let user = self.identity.resolve(identity).await?;
        let events = self.events.list_by_owner(user.id).await?;
        debug!(user_id = %user.id, count = events.len(), "Listed own events");
        Ok(events)
    }

    pub async fn list_swappable_slots(&self, identity: &str) -> DomainResult<Vec<Event>> {
        let user = self.identity.resolve(identity).await?;
        let events = self.events.list_swappable_excluding(user.id).await?;
        debug!(user_id = %user.id, count = events.len(), "Listed marketplace slots");
        Ok(events)
    }

    pub async fn create_event(
        &self,
        identity: &str,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> DomainResult<Event> {
        let user = self.identity.resolve(identity).await?;
        let new_event = NewEvent::new(title, start_time, end_time, user.id)?;
        let event = self.events.create(new_event).await?;
        info!(event_id = %event.id, user_id = %user.id, "Event created");
        Ok(event)
    }

    pub async fn set_status(
        &self,
        identity: &str,
        event_id: EventId,
        status: EventStatus,
    ) -> DomainResult<Event> {
        let user = self.identity.resolve(identity).await?;
        let event = self.events.change_status(event_id, user.id, status).await?;
        info!(event_id = %event.id, user_id = %user.id, status = %event.status, "Event status changed");
        Ok(event)
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in
//! `crate::domain::repository`.
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresUserRepository** - accounts, unique email
//! - **PostgresEventRepository** - calendar slots
//! - **PostgresSwapRequestRepository** - swap requests; owns the
//!   transactions that lock and rewrite slots
//!
//! ## In-Memory Store
//!
//! **InMemoryStore** implements all three traits over a single state guarded
//! by one `parking_lot::RwLock`. Every atomic operation runs entirely under
//! the write guard, which makes it the in-process equivalent of a
//! serializable transaction. Used for development and tests.

pub mod postgres_event;
pub mod postgres_swap;
pub mod postgres_user;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::error::DomainError;
use crate::domain::event::{Event, EventId, EventStatus, NewEvent};
use crate::domain::repository::{
    EventRepository, RepositoryError, SwapRequestRepository, SwapResolution, UserRepository,
};
use crate::domain::swap::{self, SwapDecision, SwapRequest, SwapRequestId, SwapRequestView};
use crate::domain::user::{NewUser, User, UserId};

#[derive(Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    requests: BTreeMap<SwapRequestId, SwapRequest>,
    next_user_id: i64,
    next_event_id: i64,
    next_request_id: i64,
}

impl StoreState {
    fn event(&self, id: EventId) -> Result<Event, DomainError> {
        self.events
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("event {} not found", id)))
    }

    fn view(&self, request: &SwapRequest) -> Result<SwapRequestView, RepositoryError> {
        let dangling = |what: &str| {
            RepositoryError::Unknown(format!("swap request {} references a missing {}", request.id, what))
        };
        let requester = self.users.get(&request.requester_id).ok_or_else(|| dangling("user"))?;
        let offered = self.events.get(&request.offered_slot_id).ok_or_else(|| dangling("event"))?;
        let desired = self.events.get(&request.desired_slot_id).ok_or_else(|| dangling("event"))?;

        Ok(SwapRequestView {
            request: request.clone(),
            requester_name: requester.name.clone(),
            offered_slot_title: offered.title.clone(),
            offered_slot_start_time: offered.start_time,
            desired_slot_title: desired.title.clone(),
        })
    }

    fn views_where(
        &self,
        predicate: impl Fn(&SwapRequest) -> bool,
    ) -> Result<Vec<SwapRequestView>, RepositoryError> {
        // ids are assigned in creation order
        self.requests
            .values()
            .rev()
            .filter(|&r| predicate(r))
            .map(|r| self.view(r))
            .collect()
    }
}

fn sorted_by_start(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
    events
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.write();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }

        state.next_user_id += 1;
        let created = User {
            id: UserId(state.next_user_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.read().users.get(&id).cloned())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn create(&self, event: NewEvent) -> Result<Event, RepositoryError> {
        let mut state = self.state.write();
        if !state.users.contains_key(&event.owner_id) {
            return Err(RepositoryError::NotFound(format!("user {} not found", event.owner_id)));
        }
        state.next_event_id += 1;
        let created = event.into_event(EventId(state.next_event_id));
        state.events.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        Ok(self.state.read().events.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Event>, RepositoryError> {
        let state = self.state.read();
        let events = state
            .events
            .values()
            .filter(|e| e.owner_id == owner)
            .cloned()
            .collect();
        Ok(sorted_by_start(events))
    }

    async fn list_swappable_excluding(&self, viewer: UserId) -> Result<Vec<Event>, RepositoryError> {
        let state = self.state.read();
        let events = state
            .events
            .values()
            .filter(|e| e.status == EventStatus::Swappable && e.owner_id != viewer)
            .cloned()
            .collect();
        Ok(sorted_by_start(events))
    }

    async fn change_status(
        &self,
        id: EventId,
        caller: UserId,
        new_status: EventStatus,
    ) -> Result<Event, DomainError> {
        let mut state = self.state.write();
        let mut event = state.event(id)?;
        event.change_status(caller, new_status)?;
        state.events.insert(id, event.clone());
        Ok(event)
    }
}

#[async_trait]
impl SwapRequestRepository for InMemoryStore {
    async fn find_by_id(&self, id: SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError> {
        Ok(self.state.read().requests.get(&id).cloned())
    }

    async fn find_view(&self, id: SwapRequestId) -> Result<Option<SwapRequestView>, RepositoryError> {
        let state = self.state.read();
        state.requests.get(&id).map(|r| state.view(r)).transpose()
    }

    async fn list_incoming(&self, responder: UserId) -> Result<Vec<SwapRequestView>, RepositoryError> {
        self.state.read().views_where(|r| r.responder_id == responder)
    }

    async fn list_outgoing(&self, requester: UserId) -> Result<Vec<SwapRequestView>, RepositoryError> {
        self.state.read().views_where(|r| r.requester_id == requester)
    }

    async fn create_pending(
        &self,
        requester: UserId,
        offered: EventId,
        desired: EventId,
    ) -> Result<SwapRequestView, DomainError> {
        let mut state = self.state.write();
        let mut offered = state.event(offered)?;
        let mut desired = state.event(desired)?;

        let proposal = swap::propose(requester, &mut offered, &mut desired)?;

        state.next_request_id += 1;
        let request = proposal.into_request(SwapRequestId(state.next_request_id), Utc::now());
        state.events.insert(offered.id, offered);
        state.events.insert(desired.id, desired);
        let view = state.view(&request)?;
        state.requests.insert(request.id, request);
        Ok(view)
    }

    async fn resolve(
        &self,
        id: SwapRequestId,
        responder: UserId,
        decision: SwapDecision,
    ) -> Result<SwapResolution, DomainError> {
        let mut state = self.state.write();
        let mut request = state
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("swap request {} not found", id)))?;
        request.ensure_respondable_by(responder)?;

        let mut offered = state.event(request.offered_slot_id)?;
        let mut desired = state.event(request.desired_slot_id)?;
        let code = request.resolve(responder, decision, &mut offered, &mut desired)?;

        state.events.insert(offered.id, offered);
        state.events.insert(desired.id, desired);
        let view = state.view(&request)?;
        state.requests.insert(request.id, request);
        Ok(SwapResolution { view, code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::domain::swap::SwapStatus;

    async fn user(store: &InMemoryStore, name: &str) -> User {
        let email = format!("{}@example.com", name.to_lowercase());
        UserRepository::create(store, NewUser::new(name, &email, "hash".to_string()).unwrap())
            .await
            .unwrap()
    }

    async fn swappable(store: &InMemoryStore, owner: UserId, title: &str, offset_hours: i64) -> Event {
        let start = Utc::now() + Duration::hours(offset_hours);
        let event = EventRepository::create(
            store,
            NewEvent::new(title, start, start + Duration::hours(1), owner).unwrap(),
        )
        .await
        .unwrap();
        store
            .change_status(event.id, owner, EventStatus::Swappable)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = InMemoryStore::new();
        user(&store, "Alice").await;
        let dup = NewUser::new("Other", "ALICE@example.com", "hash".to_string()).unwrap();
        let err = UserRepository::create(&store, dup).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_lists_are_ordered_by_start_time() {
        let store = InMemoryStore::new();
        let alice = user(&store, "Alice").await;
        let bob = user(&store, "Bob").await;
        swappable(&store, alice.id, "Late", 5).await;
        swappable(&store, alice.id, "Early", 1).await;
        swappable(&store, bob.id, "Bob's", 3).await;

        let mine: Vec<_> = store.list_by_owner(alice.id).await.unwrap();
        let titles: Vec<_> = mine.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Late"]);

        let market = store.list_swappable_excluding(bob.id).await.unwrap();
        assert_eq!(market.len(), 2);
        assert!(market.iter().all(|e| e.owner_id == alice.id));
    }

    #[tokio::test]
    async fn test_create_pending_failure_leaves_store_untouched() {
        let store = InMemoryStore::new();
        let alice = user(&store, "Alice").await;
        let bob = user(&store, "Bob").await;
        let a = swappable(&store, alice.id, "A", 1).await;
        let b = swappable(&store, bob.id, "B", 2).await;
        store.change_status(b.id, bob.id, EventStatus::Busy).await.unwrap();

        let err = store.create_pending(alice.id, a.id, b.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        let a_after = EventRepository::find_by_id(&store, a.id).await.unwrap().unwrap();
        assert_eq!(a_after.status, EventStatus::Swappable);
        assert!(store.list_outgoing(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_views_join_display_fields() {
        let store = InMemoryStore::new();
        let alice = user(&store, "Alice").await;
        let bob = user(&store, "Bob").await;
        let a = swappable(&store, alice.id, "Morning", 1).await;
        let b = swappable(&store, bob.id, "Evening", 2).await;

        let created = store.create_pending(alice.id, a.id, b.id).await.unwrap();
        assert_eq!(created.request.status, SwapStatus::Pending);
        let view = store.find_view(created.request.id).await.unwrap().unwrap();
        assert_eq!(view, created);
        assert_eq!(view.requester_name, "Alice");
        assert_eq!(view.offered_slot_title, "Morning");
        assert_eq!(view.desired_slot_title, "Evening");
        assert_eq!(view.offered_slot_start_time, a.start_time);

        assert_eq!(store.list_incoming(bob.id).await.unwrap().len(), 1);
        assert!(store.list_incoming(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let store = InMemoryStore::new();
        let alice = user(&store, "Alice").await;
        let err = store
            .change_status(EventId(99), alice.id, EventStatus::Swappable)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}

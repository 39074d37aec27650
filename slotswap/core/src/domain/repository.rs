// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root. Interfaces live in the
//! domain layer and are implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `UserRepository` | `User` | `InMemoryStore`, `PostgresUserRepository` |
//! | `EventRepository` | `Event` | `InMemoryStore`, `PostgresEventRepository` |
//! | `SwapRequestRepository` | `SwapRequest` | `InMemoryStore`, `PostgresSwapRequestRepository` |
//!
//! ## Atomic operations
//!
//! `EventRepository::change_status`, `SwapRequestRepository::create_pending`
//! and `SwapRequestRepository::resolve` are read-validate-write operations.
//! Implementations load the affected rows under an exclusive lock, run the
//! pure transition from `crate::domain::event` / `crate::domain::swap`, and
//! write back only if it succeeded. They therefore return `DomainError`
//! rather than `RepositoryError`: a lost race surfaces as `InvalidState`.

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::event::{Event, EventId, EventStatus, NewEvent};
use crate::domain::notification::NotificationCode;
use crate::domain::swap::{SwapDecision, SwapRequest, SwapRequestId, SwapRequestView};
use crate::domain::user::{NewUser, User, UserId};

/// Storage backend selected at startup from `slotswap-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with `Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Emails are stored normalized; callers pass the normalized form.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: NewEvent) -> Result<Event, RepositoryError>;

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, RepositoryError>;

    /// Every event owned by the user, any status, ordered by start time.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Event>, RepositoryError>;

    /// Marketplace view: `SWAPPABLE` events not owned by `viewer`.
    async fn list_swappable_excluding(&self, viewer: UserId) -> Result<Vec<Event>, RepositoryError>;

    /// Owner-initiated status change, applied atomically via
    /// [`Event::change_status`].
    async fn change_status(
        &self,
        id: EventId,
        caller: UserId,
        new_status: EventStatus,
    ) -> Result<Event, DomainError>;
}

/// Result of a committed `resolve`. The view is read inside the same
/// transaction, so it shows exactly the state that was committed.
#[derive(Debug, Clone)]
pub struct SwapResolution {
    pub view: SwapRequestView,
    pub code: NotificationCode,
}

#[async_trait]
pub trait SwapRequestRepository: Send + Sync {
    async fn find_by_id(&self, id: SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError>;

    /// Request joined with requester name and both slot titles.
    async fn find_view(&self, id: SwapRequestId) -> Result<Option<SwapRequestView>, RepositoryError>;

    /// Requests where the user is the responder, newest first.
    async fn list_incoming(&self, responder: UserId) -> Result<Vec<SwapRequestView>, RepositoryError>;

    /// Requests where the user is the requester, newest first.
    async fn list_outgoing(&self, requester: UserId) -> Result<Vec<SwapRequestView>, RepositoryError>;

    /// Lock both slots, validate with [`crate::domain::swap::propose`], mark
    /// them `SWAP_PENDING` and insert a `PENDING` request. All or nothing.
    /// Returns the new request's view as of the commit.
    async fn create_pending(
        &self,
        requester: UserId,
        offered: EventId,
        desired: EventId,
    ) -> Result<SwapRequestView, DomainError>;

    /// Lock the request and both slots, apply [`SwapRequest::resolve`] and
    /// persist all three rows. All or nothing.
    async fn resolve(
        &self,
        id: SwapRequestId,
        responder: UserId,
        decision: SwapDecision,
    ) -> Result<SwapResolution, DomainError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::from(RepositoryError::from(err))
    }
}

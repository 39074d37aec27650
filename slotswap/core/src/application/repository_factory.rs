// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory
//!
//! Creates concrete repository implementations based on the storage backend
//! configuration. The in-memory backend hands the same `InMemoryStore` to all
//! three traits so that the negotiation transactions see one consistent state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::repository::{
    EventRepository, StorageBackend, SwapRequestRepository, UserRepository,
};
use crate::infrastructure::repositories::postgres_event::PostgresEventRepository;
use crate::infrastructure::repositories::postgres_swap::PostgresSwapRequestRepository;
use crate::infrastructure::repositories::postgres_user::PostgresUserRepository;
use crate::infrastructure::repositories::InMemoryStore;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventRepository>,
    pub swaps: Arc<dyn SwapRequestRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            events: Arc::new(store.clone()),
            swaps: Arc::new(store),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            events: Arc::new(PostgresEventRepository::new(pool.clone())),
            swaps: Arc::new(PostgresSwapRequestRepository::new(pool)),
        }
    }
}

/// Creates the repository set for the configured backend. A PostgreSQL
/// backend requires a connected pool.
pub fn create_repositories(backend: &StorageBackend, pool: Option<PgPool>) -> anyhow::Result<Repositories> {
    match (backend, pool) {
        (StorageBackend::InMemory, _) => Ok(Repositories::in_memory()),
        (StorageBackend::PostgreSQL(_), Some(pool)) => Ok(Repositories::postgres(pool)),
        (StorageBackend::PostgreSQL(_), None) => {
            anyhow::bail!("PostgreSQL backend selected but no connection pool was provided")
        }
    }
}

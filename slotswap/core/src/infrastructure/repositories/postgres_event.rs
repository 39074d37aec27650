// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Event
//!
//! Calendar slot persistence. Row parsing helpers are shared with
//! `postgres_swap`, which locks and rewrites event rows inside its own
//! transactions.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::error::DomainError;
use crate::domain::event::{Event, EventId, EventStatus, NewEvent};
use crate::domain::repository::{EventRepository, RepositoryError};
use crate::domain::user::UserId;

pub(crate) const EVENT_COLUMNS: &str = "id, title, start_time, end_time, status, owner_id";

pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn create(&self, event: NewEvent) -> Result<Event, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO events (title, start_time, end_time, status, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(&event.title)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(EventStatus::Busy.as_str())
        .bind(event.owner_id.0)
        .fetch_one(&self.pool)
        .await?;

        parse_event_row(&row)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_event_row).transpose()
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Event>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE owner_id = $1 ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_event_row).collect()
    }

    async fn list_swappable_excluding(&self, viewer: UserId) -> Result<Vec<Event>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE status = $1 AND owner_id <> $2 ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .bind(EventStatus::Swappable.as_str())
        .bind(viewer.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_event_row).collect()
    }

    async fn change_status(
        &self,
        id: EventId,
        caller: UserId,
        new_status: EventStatus,
    ) -> Result<Event, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("event {} not found", id)))?;

        let mut event = parse_event_row(&row)?;
        event.change_status(caller, new_status)?;

        sqlx::query("UPDATE events SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.0)
            .bind(event.status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(event)
    }
}

pub(crate) fn parse_event_row(row: &PgRow) -> Result<Event, RepositoryError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<EventStatus>()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    Ok(Event {
        id: EventId(row.try_get("id")?),
        title: row.try_get("title")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        status,
        owner_id: UserId(row.try_get("owner_id")?),
    })
}

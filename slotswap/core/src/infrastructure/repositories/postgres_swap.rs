// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Swap Request
//!
//! Owns the two negotiation transactions. Both lock the event rows with
//! `SELECT ... FOR UPDATE ORDER BY id` so concurrent proposals touching the
//! same slot serialize and always acquire locks in the same order. The loser
//! of a race re-reads the winner's `SWAP_PENDING` status and fails with
//! `InvalidState`. Any early return drops the transaction, which rolls it back.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};

use super::postgres_event::{parse_event_row, EVENT_COLUMNS};
use crate::domain::error::DomainError;
use crate::domain::event::{Event, EventId};
use crate::domain::repository::{RepositoryError, SwapRequestRepository, SwapResolution};
use crate::domain::swap::{
    self, SwapDecision, SwapRequest, SwapRequestId, SwapRequestView, SwapStatus,
};
use crate::domain::user::UserId;

const REQUEST_COLUMNS: &str =
    "id, requester_id, responder_id, offered_slot_id, desired_slot_id, status, created_at, updated_at";

const VIEW_SELECT: &str = r#"
    SELECT
        sr.id, sr.requester_id, sr.responder_id, sr.offered_slot_id, sr.desired_slot_id,
        sr.status, sr.created_at, sr.updated_at,
        u.name AS requester_name,
        o.title AS offered_slot_title,
        o.start_time AS offered_slot_start_time,
        d.title AS desired_slot_title
    FROM swap_requests sr
    JOIN users u ON u.id = sr.requester_id
    JOIN events o ON o.id = sr.offered_slot_id
    JOIN events d ON d.id = sr.desired_slot_id
"#;

pub struct PostgresSwapRequestRepository {
    pool: PgPool,
}

impl PostgresSwapRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_views(&self, filter: &str, user: UserId) -> Result<Vec<SwapRequestView>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{} WHERE {} = $1 ORDER BY sr.created_at DESC, sr.id DESC",
            VIEW_SELECT, filter
        ))
        .bind(user.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_view_row).collect()
    }
}

/// Lock both slots in id order and return them as `(first, second)` in the
/// order the caller asked for.
async fn lock_slot_pair(
    tx: &mut Transaction<'_, Postgres>,
    first: EventId,
    second: EventId,
) -> Result<(Event, Event), DomainError> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM events WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        EVENT_COLUMNS
    ))
    .bind(vec![first.0, second.0])
    .fetch_all(&mut **tx)
    .await?;

    let events = rows
        .iter()
        .map(parse_event_row)
        .collect::<Result<Vec<_>, _>>()?;

    let take = |id: EventId| {
        events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("event {} not found", id)))
    };
    Ok((take(first)?, take(second)?))
}

/// View of a request as seen by the open transaction.
async fn view_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: SwapRequestId,
) -> Result<SwapRequestView, DomainError> {
    let row = sqlx::query(&format!("{} WHERE sr.id = $1", VIEW_SELECT))
        .bind(id.0)
        .fetch_one(&mut **tx)
        .await?;
    Ok(parse_view_row(&row)?)
}

async fn write_slot(tx: &mut Transaction<'_, Postgres>, event: &Event) -> Result<(), DomainError> {
    sqlx::query(
        "UPDATE events SET owner_id = $2, status = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(event.id.0)
    .bind(event.owner_id.0)
    .bind(event.status.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl SwapRequestRepository for PostgresSwapRequestRepository {
    async fn find_by_id(&self, id: SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM swap_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(parse_request_row).transpose()
    }

    async fn find_view(&self, id: SwapRequestId) -> Result<Option<SwapRequestView>, RepositoryError> {
        let row = sqlx::query(&format!("{} WHERE sr.id = $1", VIEW_SELECT))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_view_row).transpose()
    }

    async fn list_incoming(&self, responder: UserId) -> Result<Vec<SwapRequestView>, RepositoryError> {
        self.list_views("sr.responder_id", responder).await
    }

    async fn list_outgoing(&self, requester: UserId) -> Result<Vec<SwapRequestView>, RepositoryError> {
        self.list_views("sr.requester_id", requester).await
    }

    async fn create_pending(
        &self,
        requester: UserId,
        offered: EventId,
        desired: EventId,
    ) -> Result<SwapRequestView, DomainError> {
        let mut tx = self.pool.begin().await?;

        let (mut offered, mut desired) = lock_slot_pair(&mut tx, offered, desired).await?;
        let proposal = swap::propose(requester, &mut offered, &mut desired)?;

        write_slot(&mut tx, &offered).await?;
        write_slot(&mut tx, &desired).await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO swap_requests (requester_id, responder_id, offered_slot_id, desired_slot_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(proposal.requester_id.0)
        .bind(proposal.responder_id.0)
        .bind(proposal.offered_slot_id.0)
        .bind(proposal.desired_slot_id.0)
        .bind(SwapStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let request = parse_request_row(&row)?;
        let view = view_in_tx(&mut tx, request.id).await?;

        tx.commit().await?;
        Ok(view)
    }

    async fn resolve(
        &self,
        id: SwapRequestId,
        responder: UserId,
        decision: SwapDecision,
    ) -> Result<SwapResolution, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM swap_requests WHERE id = $1 FOR UPDATE",
            REQUEST_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("swap request {} not found", id)))?;
        let mut request = parse_request_row(&row)?;
        request.ensure_respondable_by(responder)?;

        let (mut offered, mut desired) =
            lock_slot_pair(&mut tx, request.offered_slot_id, request.desired_slot_id).await?;
        let code = request.resolve(responder, decision, &mut offered, &mut desired)?;

        write_slot(&mut tx, &offered).await?;
        write_slot(&mut tx, &desired).await?;
        sqlx::query("UPDATE swap_requests SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(request.id.0)
            .bind(request.status.as_str())
            .bind(request.updated_at)
            .execute(&mut *tx)
            .await?;
        let view = view_in_tx(&mut tx, request.id).await?;

        tx.commit().await?;
        Ok(SwapResolution { view, code })
    }
}

fn parse_request_row(row: &PgRow) -> Result<SwapRequest, RepositoryError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<SwapStatus>()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    Ok(SwapRequest {
        id: SwapRequestId(row.try_get("id")?),
        requester_id: UserId(row.try_get("requester_id")?),
        responder_id: UserId(row.try_get("responder_id")?),
        offered_slot_id: EventId(row.try_get("offered_slot_id")?),
        desired_slot_id: EventId(row.try_get("desired_slot_id")?),
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_view_row(row: &PgRow) -> Result<SwapRequestView, RepositoryError> {
    Ok(SwapRequestView {
        request: parse_request_row(row)?,
        requester_name: row.try_get("requester_name")?,
        offered_slot_title: row.try_get("offered_slot_title")?,
        offered_slot_start_time: row.try_get("offered_slot_start_time")?,
        desired_slot_title: row.try_get("desired_slot_title")?,
    })
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # HTTP API
//!
//! | Method & path | Handler |
//! |---|---|
//! | `POST /auth/signup` | [`signup`] |
//! | `POST /auth/login` | [`login`] |
//! | `GET /api/events` | [`list_my_events`] |
//! | `POST /api/events` | [`create_event`] |
//! | `PUT /api/events/{id}/status` | [`set_event_status`] |
//! | `GET /api/swappable-slots` | [`list_swappable_slots`] |
//! | `POST /api/swap-request` | [`create_swap_request`] |
//! | `GET /api/swap-requests/incoming` | [`incoming_requests`] |
//! | `GET /api/swap-requests/outgoing` | [`outgoing_requests`] |
//! | `POST /api/swap-response/{requestId}` | [`respond_to_swap_request`] |
//! | `GET /api/notifications/stream` | [`notification_stream`] (SSE) |
//! | `GET /health` | [`health`] |
//!
//! Everything under `/api` requires `Authorization: Bearer <token>`. Only the
//! notification stream also accepts `?access_token=<token>`, because browser
//! `EventSource` cannot set request headers.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::event_service::EventService;
use crate::application::identity::IdentityResolver;
use crate::application::repository_factory::Repositories;
use crate::application::summary::{EventSummary, SwapRequestSummary};
use crate::application::swap_service::SwapService;
use crate::domain::error::DomainError;
use crate::domain::event::{EventId, EventStatus};
use crate::domain::swap::SwapRequestId;
use crate::infrastructure::credentials::TokenIssuer;
use crate::infrastructure::notification_bus::{NotificationBus, NotificationBusError};
use crate::presentation::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub events: EventService,
    pub swaps: SwapService,
    pub identity: IdentityResolver,
    pub notifications: NotificationBus,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(repositories: Repositories, tokens: TokenIssuer, notifications: NotificationBus) -> Self {
        let identity = IdentityResolver::new(repositories.users.clone());
        Self {
            auth: AuthService::new(repositories.users.clone(), tokens),
            events: EventService::new(repositories.events.clone(), identity.clone()),
            swaps: SwapService::new(
                repositories.swaps.clone(),
                identity.clone(),
                Arc::new(notifications.clone()),
            ),
            identity,
            notifications,
            started_at: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/api/events", get(list_my_events).post(create_event))
        .route("/api/events/{id}/status", put(set_event_status))
        .route("/api/swappable-slots", get(list_swappable_slots))
        .route("/api/swap-request", post(create_swap_request))
        .route("/api/swap-requests/incoming", get(incoming_requests))
        .route("/api/swap-requests/outgoing", get(outgoing_requests))
        .route("/api/swap-response/{request_id}", post(respond_to_swap_request))
        .route("/api/notifications/stream", get(notification_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticated caller identity (the email carried in the bearer token).
#[derive(Debug, Clone)]
pub struct Caller(pub String);

/// Caller of the notification stream. Browser `EventSource` cannot set
/// headers, so this one also accepts `?access_token=`.
#[derive(Debug, Clone)]
pub struct StreamCaller(pub String);

fn header_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn query_token(parts: &Parts) -> Option<String> {
    parts.uri.query().and_then(|query| {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("access_token="))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

fn authenticate(state: &AppState, token: Option<String>) -> Result<String, ApiError> {
    let token =
        token.ok_or_else(|| DomainError::Unauthenticated("missing bearer token".to_string()))?;
    Ok(state.auth.authenticate(&token)?)
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(state, header_token(parts)).map(Caller)
    }
}

impl FromRequestParts<AppState> for StreamCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = if parts.headers.contains_key(AUTHORIZATION) {
            header_token(parts)
        } else {
            query_token(parts)
        };
        authenticate(state, token).map(StreamCaller)
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = payload?;
    let token = state.auth.signup(&body.name, &body.email, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = payload?;
    let token = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: EventStatus,
}

async fn list_my_events(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<Vec<EventSummary>>, ApiError> {
    let events = state.events.list_my_events(&identity).await?;
    Ok(Json(events.into_iter().map(EventSummary::from).collect()))
}

async fn create_event(
    State(state): State<AppState>,
    Caller(identity): Caller,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventSummary>), ApiError> {
    let Json(body) = payload?;
    let event = state
        .events
        .create_event(&identity, &body.title, body.start_time, body.end_time)
        .await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

async fn set_event_status(
    State(state): State<AppState>,
    Caller(identity): Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<EventSummary>, ApiError> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let event = state
        .events
        .set_status(&identity, EventId(id), body.status)
        .await?;
    Ok(Json(event.into()))
}

async fn list_swappable_slots(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<Vec<EventSummary>>, ApiError> {
    let events = state.events.list_swappable_slots(&identity).await?;
    Ok(Json(events.into_iter().map(EventSummary::from).collect()))
}

// ============================================================================
// Swap negotiation
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapRequest {
    pub my_slot_id: i64,
    pub their_slot_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SwapResponseRequest {
    pub accepted: bool,
}

async fn create_swap_request(
    State(state): State<AppState>,
    Caller(identity): Caller,
    payload: Result<Json<CreateSwapRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SwapRequestSummary>), ApiError> {
    let Json(body) = payload?;
    let summary = state
        .swaps
        .create_swap_request(EventId(body.my_slot_id), EventId(body.their_slot_id), &identity)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn incoming_requests(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<Vec<SwapRequestSummary>>, ApiError> {
    Ok(Json(state.swaps.incoming_requests(&identity).await?))
}

async fn outgoing_requests(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<Vec<SwapRequestSummary>>, ApiError> {
    Ok(Json(state.swaps.outgoing_requests(&identity).await?))
}

async fn respond_to_swap_request(
    State(state): State<AppState>,
    Caller(identity): Caller,
    request_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SwapResponseRequest>, JsonRejection>,
) -> Result<Json<SwapRequestSummary>, ApiError> {
    let Path(request_id) = request_id?;
    let Json(body) = payload?;
    let summary = state
        .swaps
        .respond_to_swap_request(SwapRequestId(request_id), body.accepted, &identity)
        .await?;
    Ok(Json(summary))
}

// ============================================================================
// Notifications & health
// ============================================================================

/// Server-Sent Events stream of the caller's notification codes.
async fn notification_stream(
    State(state): State<AppState>,
    StreamCaller(identity): StreamCaller,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let user = state.identity.resolve(&identity).await?;
    let receiver = state.notifications.subscribe_user(user.id);
    info!(user_id = %user.id, "Notification stream opened");

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => {
                    let event = SseEvent::default()
                        .id(notification.id.to_string())
                        .data(notification.code.as_str());
                    return Some((Ok(event), receiver));
                }
                Err(NotificationBusError::Lagged(_)) => continue,
                Err(NotificationBusError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

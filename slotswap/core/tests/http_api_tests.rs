// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface tests driving the axum router in-process.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use slotswap_core::application::repository_factory::Repositories;
use slotswap_core::infrastructure::credentials::TokenIssuer;
use slotswap_core::infrastructure::notification_bus::NotificationBus;
use slotswap_core::presentation::api::{app, AppState};

const SECRET: &[u8] = b"http-test-secret-0123456789";

fn router() -> Router {
    let tokens = TokenIssuer::new(SECRET, "slotswap", chrono::Duration::hours(1));
    app(AppState::new(
        Repositories::in_memory(),
        tokens,
        NotificationBus::new(64),
    ))
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn signup(router: &Router, name: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn swappable_slot(router: &Router, token: &str, title: &str) -> i64 {
    let (status, created) = send(
        router,
        Method::POST,
        "/api/events",
        Some(token),
        Some(json!({
            "title": title,
            "startTime": "2026-05-04T09:00:00Z",
            "endTime": "2026-05-04T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "BUSY");
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
        router,
        Method::PUT,
        &format!("/api/events/{}/status", id),
        Some(token),
        Some(json!({ "status": "SWAPPABLE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "SWAPPABLE");
    id
}

#[tokio::test]
async fn test_health_is_public() {
    let router = router();
    let (status, body) = send(&router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let router = router();
    let (status, body) = send(&router, Method::GET, "/api/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&router, Method::GET, "/api/events", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_query_token_only_accepted_on_notification_stream() {
    let router = router();
    let token = signup(&router, "Alice").await;

    let uri = format!("/api/events?access_token={}", token);
    let (status, _) = send(&router, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, Method::GET, "/api/events", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_signup_and_login() {
    let router = router();
    signup(&router, "Alice").await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({ "name": "Again", "email": "ALICE@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let (status, _) = send(
        &router,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({ "name": "Short", "email": "short@example.com", "password": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    let (status, events) = send(&router, Method::GET, "/api/events", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events, json!([]));

    let (status, body) = send(
        &router,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn test_event_validation_and_ownership() {
    let router = router();
    let alice = signup(&router, "Alice").await;
    let bob = signup(&router, "Bob").await;

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/events",
        Some(&alice),
        Some(json!({
            "title": "Backwards",
            "startTime": "2026-05-04T10:00:00Z",
            "endTime": "2026-05-04T09:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let slot = swappable_slot(&router, &alice, "Alice slot").await;

    let uri = format!("/api/events/{}/status", slot);
    let (status, _) = send(&router, Method::PUT, &uri, Some(&bob), Some(json!({ "status": "BUSY" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        Method::PUT,
        &uri,
        Some(&alice),
        Some(json!({ "status": "SWAP_PENDING" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &router,
        Method::PUT,
        "/api/events/999/status",
        Some(&alice),
        Some(json!({ "status": "BUSY" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, market) = send(&router, Method::GET, "/api/swappable-slots", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(market.as_array().unwrap().len(), 1);
    assert_eq!(market[0]["title"], "Alice slot");
    assert!(market[0]["userId"].is_i64());
}

#[tokio::test]
async fn test_swap_round_trip_over_http() {
    let router = router();
    let alice = signup(&router, "Alice").await;
    let bob = signup(&router, "Bob").await;
    let a = swappable_slot(&router, &alice, "Alice slot").await;
    let b = swappable_slot(&router, &bob, "Bob slot").await;

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/swap-request",
        Some(&alice),
        Some(json!({ "mySlotId": a, "theirSlotId": b })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["requesterName"], "Alice");
    assert_eq!(created["offeredSlotTitle"], "Alice slot");
    assert_eq!(created["desiredSlotTitle"], "Bob slot");
    assert_eq!(created["offeredSlotStartTime"], "2026-05-04T09:00:00Z");
    let request_id = created["id"].as_i64().unwrap();

    let (status, incoming) = send(&router, Method::GET, "/api/swap-requests/incoming", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(incoming[0]["id"], request_id);

    let (status, outgoing) = send(&router, Method::GET, "/api/swap-requests/outgoing", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outgoing[0]["id"], request_id);

    let uri = format!("/api/swap-response/{}", request_id);
    let (status, _) = send(&router, Method::POST, &uri, Some(&alice), Some(json!({ "accepted": true }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resolved) = send(&router, Method::POST, &uri, Some(&bob), Some(json!({ "accepted": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "ACCEPTED");

    let (status, _) = send(&router, Method::POST, &uri, Some(&bob), Some(json!({ "accepted": false }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, alice_events) = send(&router, Method::GET, "/api/events", Some(&alice), None).await;
    assert_eq!(alice_events.as_array().unwrap().len(), 1);
    assert_eq!(alice_events[0]["id"], b);
    assert_eq!(alice_events[0]["status"], "BUSY");

    let (status, _) = send(&router, Method::POST, "/api/swap-response/abc", Some(&bob), Some(json!({ "accepted": true }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_notification_stream_receives_new_request() {
    let router = router();
    let alice = signup(&router, "Alice").await;
    let bob = signup(&router, "Bob").await;
    let a = swappable_slot(&router, &alice, "A").await;
    let b = swappable_slot(&router, &bob, "B").await;

    let stream_request = Request::builder()
        .uri(format!("/api/notifications/stream?access_token={}", bob))
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(stream_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
    let mut body = response.into_body();

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/swap-request",
        Some(&alice),
        Some(json!({ "mySlotId": a, "theirSlotId": b })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("no notification within timeout")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("data: NEW_REQUEST"), "unexpected frame: {}", text);
}

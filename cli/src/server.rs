// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! HTTP server bootstrap: configuration, storage, credentials and the axum
//! router wired together, served until a shutdown signal arrives.

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use slotswap_core::application::repository_factory::create_repositories;
use slotswap_core::domain::repository::StorageBackend;
use slotswap_core::domain::server_config::{CorsConfig, ServerConfigManifest};
use slotswap_core::infrastructure::credentials::TokenIssuer;
use slotswap_core::infrastructure::db::Database;
use slotswap_core::infrastructure::notification_bus::NotificationBus;
use slotswap_core::presentation::api::{app, AppState};

use crate::commands::migrate::MIGRATOR;

pub async fn run(config: ServerConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    info!(
        name = %config.metadata.name,
        backend = ?config.spec.storage.backend,
        "SlotSwap server starting"
    );

    let backend = config.storage_backend()?;
    let pool = match &backend {
        StorageBackend::InMemory => {
            warn!("Using in-memory storage; data is lost on shutdown");
            None
        }
        StorageBackend::PostgreSQL(pg) => {
            let db = Database::new(pg).await?;
            if config.spec.storage.auto_migrate {
                MIGRATOR
                    .run(db.get_pool())
                    .await
                    .context("Failed to apply migrations")?;
                info!("Database migrations applied");
            }
            Some(db.get_pool().clone())
        }
    };
    let repositories = create_repositories(&backend, pool)?;

    let secret = config.jwt_secret()?;
    let ttl_hours = i64::try_from(config.spec.auth.token_ttl_hours)
        .context("spec.auth.token_ttl_hours is out of range")?;
    let ttl = chrono::Duration::try_hours(ttl_hours)
        .context("spec.auth.token_ttl_hours is out of range")?;
    let tokens = TokenIssuer::new(secret.as_bytes(), config.spec.auth.issuer.clone(), ttl);

    let notifications = NotificationBus::new(config.spec.notifications.channel_capacity);

    let metrics = &config.spec.observability.metrics;
    if metrics.enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics.port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", addr);
    }

    let router = app(AppState::new(repositories, tokens, notifications))
        .layer(cors_layer(&config.spec.cors)?);

    let addr = format!(
        "{}:{}",
        config.spec.server.bind_address, config.spec.server.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down");

    Ok(())
}

fn cors_layer(config: &CorsConfig) -> Result<CorsLayer> {
    let allow_origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid CORS origin '{}'", origin))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `slotswap health`: check a running server's `/health` endpoint.

use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Duration;

pub async fn execute(host: &str, port: u16) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .context("Failed to create HTTP client")?;

    let url = health_url(host, port);
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("No SlotSwap server reachable at {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Server at {} answered with HTTP {}", url, status);
    }

    let body: serde_json::Value = response
        .json()
        .await
        .context("Health endpoint returned an unreadable body")?;

    println!("{}", format!("✓ Server is {}", body["status"].as_str().unwrap_or("up")).green());
    if let Some(uptime) = body["uptime_seconds"].as_u64() {
        println!("  Uptime: {}s", uptime);
    }

    Ok(())
}

fn health_url(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}/health", host.trim_end_matches('/'), port)
    } else {
        format!("http://{}:{}/health", host, port)
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Database Migration Command
//!
//! Implements `slotswap migrate`, which brings the PostgreSQL schema in line
//! with the migrations embedded in the binary.
//!
//! # Usage
//!
//! ```bash
//! # Apply all pending migrations
//! slotswap migrate
//!
//! # Preview migrations without applying
//! slotswap migrate --dry-run
//! ```
//!
//! The connection string comes from `spec.storage.database_url` or the
//! `SLOTSWAP_DATABASE_URL` environment variable.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;

use slotswap_core::domain::repository::StorageBackend;
use slotswap_core::domain::server_config::ServerConfigManifest;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Args)]
pub struct MigrateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: MigrateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "SlotSwap Migrate".bold().green());

    let config = ServerConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    let pg = match config.storage_backend()? {
        StorageBackend::PostgreSQL(pg) => pg,
        StorageBackend::InMemory => anyhow::bail!(
            "Storage backend is 'memory'. Set spec.storage.database_url or SLOTSWAP_DATABASE_URL to migrate."
        ),
    };

    println!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&pg.connection_string)
        .await
        .context("Failed to connect to database")?;

    // The bookkeeping table does not exist before the first run.
    let applied_count = sqlx::query("SELECT version FROM _sqlx_migrations")
        .fetch_all(&pool)
        .await
        .map(|rows| rows.len())
        .unwrap_or(0);

    let total_migrations = MIGRATOR.iter().count();

    println!(
        "Migration status: {} applied, {} total available.",
        applied_count, total_migrations
    );

    if applied_count >= total_migrations {
        println!("{}", "✓ Database is up to date.".green());
        return Ok(());
    }

    if cmd.dry_run {
        println!("Pending migrations found (Dry Run):");
        for migration in MIGRATOR.iter().skip(applied_count) {
            println!(" - {} {}", migration.version, migration.description);
        }
        println!("Skipping application due to --dry-run");
        return Ok(());
    }

    println!("Applying pending migrations...");
    MIGRATOR.run(&pool).await.context("Failed to apply migrations")?;
    println!("{}", "✓ Database updated successfully.".green());

    Ok(())
}

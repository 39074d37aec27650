// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use slotswap_core::domain::server_config::{ServerConfigManifest, StorageKind};

const ANNOTATED_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./slotswap-config.yaml)
        #[arg(short, long, default_value = "./slotswap-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(&output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServerConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. SLOTSWAP_CONFIG_PATH: {}",
            std::env::var("SLOTSWAP_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./slotswap-config.yaml");
        println!("  4. ~/.slotswap/config.yaml");
        println!("  5. /etc/slotswap/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let spec = &config.spec;
    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    println!("  CORS origins: {}", spec.cors.allowed_origins.join(", "));
    println!();

    println!("{}", "Storage:".bold());
    match spec.storage.backend {
        StorageKind::Memory => println!("  Backend: memory"),
        StorageKind::Postgres => {
            println!("  Backend: postgres");
            // The URL usually embeds a password.
            let url = spec.storage.database_url.as_deref().unwrap_or("(not set)");
            println!("  Database URL: {}", redact(url));
            println!("  Max connections: {}", spec.storage.max_connections);
            println!("  Auto-migrate: {}", spec.storage.auto_migrate);
        }
    }
    println!();

    println!("{}", "Auth:".bold());
    println!("  JWT secret: {}", redact(&spec.auth.jwt_secret));
    println!("  Token TTL: {}h", spec.auth.token_ttl_hours);
    println!("  Issuer: {}", spec.auth.issuer);
    println!();

    println!("{}", "Observability:".bold());
    println!(
        "  Logging: {} ({:?})",
        spec.observability.logging.level, spec.observability.logging.format
    );
    if spec.observability.metrics.enabled {
        println!("  Metrics: enabled on port {}", spec.observability.metrics.port);
    } else {
        println!("  Metrics: {}", "disabled".dimmed());
    }
    println!("  Notification channel capacity: {}", spec.notifications.channel_capacity);

    Ok(())
}

/// `env:` references are safe to print; literal secrets are not.
fn redact(value: &str) -> String {
    if value.starts_with("env:") || value == "(not set)" {
        value.to_string()
    } else {
        "********".to_string()
    }
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServerConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path, with_examples: bool) -> Result<()> {
    if with_examples {
        std::fs::write(output, ANNOTATED_TEMPLATE)
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    } else {
        ServerConfigManifest::default()
            .to_yaml_file(output)
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    }

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

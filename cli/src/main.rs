// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # SlotSwap CLI
//!
//! The `slotswap` binary runs the HTTP server and bundles the operator
//! commands around it.
//!
//! ## Commands
//!
//! - `slotswap serve` - Run the HTTP API until Ctrl+C / SIGTERM
//! - `slotswap migrate [--dry-run]` - Apply PostgreSQL schema migrations
//! - `slotswap config show|validate|generate` - Configuration management
//! - `slotswap health` - Check a running server

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use slotswap::commands::{self, ConfigCommand, MigrateCommand};
use slotswap::logging::{init_logging, manifest_logging, LogSettings};
use slotswap::server;
use slotswap_core::domain::server_config::ServerConfigManifest;

/// SlotSwap - Calendar slot swap negotiation
#[derive(Parser)]
#[command(name = "slotswap")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SLOTSWAP_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (overrides spec.server.port)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// HTTP API host (overrides spec.server.bind_address)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SLOTSWAP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format (compact, json)
    #[arg(long, global = true, env = "SLOTSWAP_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    #[command(name = "serve")]
    Serve,

    /// Apply database migrations
    #[command(name = "migrate")]
    Migrate {
        #[command(flatten)]
        command: MigrateCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Check whether a server is up
    #[command(name = "health")]
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => {
            // Install the subscriber first so the config loader's own
            // messages (discovered path, env overrides) are printed.
            let file_logging = manifest_logging(cli.config.clone());
            let settings = LogSettings::resolve(
                cli.log_level.as_deref(),
                cli.log_format.as_deref(),
                file_logging.as_ref(),
            )?;
            init_logging(&settings)?;

            let mut config = ServerConfigManifest::load_or_default(cli.config)?;
            if let Some(host) = cli.host {
                config.spec.server.bind_address = host;
            }
            if let Some(port) = cli.port {
                config.spec.server.port = port;
            }

            server::run(config).await
        }
        Some(Commands::Migrate { command }) => {
            init_cli_logging(&cli.log_level, &cli.log_format)?;
            commands::migrate::execute(command, cli.config).await
        }
        Some(Commands::Config { command }) => {
            init_cli_logging(&cli.log_level, &cli.log_format)?;
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Health) => {
            init_cli_logging(&cli.log_level, &cli.log_format)?;
            let host = cli.host.unwrap_or_else(|| "127.0.0.1".to_string());
            commands::health::execute(&host, cli.port.unwrap_or(8080)).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Operator commands log at `warn` unless asked otherwise so their own
/// output stays readable.
fn init_cli_logging(level: &Option<String>, format: &Option<String>) -> Result<()> {
    let level = level.as_deref().or(Some("warn"));
    let settings = LogSettings::resolve(level, format.as_deref(), None)?;
    init_logging(&settings)
}

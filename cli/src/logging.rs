// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Tracing subscriber setup shared by the server and operator commands.

use anyhow::{Context, Result};
use std::path::PathBuf;

use slotswap_core::domain::server_config::{LogFormat, LoggingConfig, ServerConfigManifest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// Command-line values win over the manifest, which wins over `info` /
    /// compact output.
    pub fn resolve(
        level: Option<&str>,
        format: Option<&str>,
        config: Option<&LoggingConfig>,
    ) -> Result<Self> {
        let filter = level
            .map(str::to_string)
            .or_else(|| config.map(|c| c.level.clone()))
            .unwrap_or_else(|| "info".to_string());

        let format = match format {
            Some(raw) => parse_format(raw)?,
            None => config.map(|c| c.format).unwrap_or(LogFormat::Compact),
        };

        Ok(Self { filter, format })
    }
}

/// Logging section of the manifest `serve` will load, read without emitting
/// any events so the subscriber can be installed before the full load logs.
/// Unreadable files yield `None`; the full load reports them.
pub fn manifest_logging(config_path: Option<PathBuf>) -> Option<LoggingConfig> {
    let path = config_path.or_else(ServerConfigManifest::discover_config)?;
    ServerConfigManifest::from_yaml_file(path)
        .ok()
        .map(|manifest| manifest.spec.observability.logging)
}

fn parse_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("Unknown log format '{}'. Expected 'compact' or 'json'", other),
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` takes precedence
/// over the resolved filter.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&settings.filter))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match settings.format {
        LogFormat::Compact => builder.with_target(false).compact().init(),
        LogFormat::Json => builder.with_target(true).json().init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_logging() -> LoggingConfig {
        LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
        }
    }

    #[test]
    fn test_flags_override_manifest() {
        let settings = LogSettings::resolve(Some("warn"), Some("compact"), Some(&manifest_logging())).unwrap();
        assert_eq!(settings.filter, "warn");
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn test_manifest_used_when_flags_absent() {
        let settings = LogSettings::resolve(None, None, Some(&manifest_logging())).unwrap();
        assert_eq!(settings.filter, "debug");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let settings = LogSettings::resolve(None, None, None).unwrap();
        assert_eq!(settings.filter, "info");
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn test_manifest_logging_reads_file_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slotswap.yaml");
        std::fs::write(
            &path,
            "apiVersion: slotswap.io/v1\nkind: ServerConfig\nmetadata:\n  name: t\nspec:\n  observability:\n    logging:\n      level: debug\n      format: json\n",
        )
        .unwrap();

        let logging = super::manifest_logging(Some(path)).unwrap();
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);

        assert!(super::manifest_logging(Some(dir.path().join("missing.yaml"))).is_none());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(LogSettings::resolve(None, Some("pretty"), None).is_err());
    }
}

// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

// Server Configuration Types
//
// Defines the configuration schema for a SlotSwap server, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP listener and CORS settings
// - Storage backend selection (in-memory or PostgreSQL)
// - Token signing and notification channel sizing
// - Logging and metrics settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "slotswap.io/v1";
pub const KIND: &str = "ServerConfig";

/// Shortest accepted HMAC secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 16;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

/// Top-level Kubernetes-style server configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfigManifest {
    /// API version (must be "slotswap.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServerConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ServerConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfigSpec {
    #[serde(default)]
    pub server: HttpConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_kind")]
    pub backend: StorageKind,

    /// PostgreSQL connection string (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply pending migrations when the server starts
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for bearer tokens (supports "env:VAR_NAME")
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    #[serde(default = "default_issuer")]
    pub issuer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Browser origins allowed to call the API. `*` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Per-process broadcast buffer. Slow subscribers lag past this.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or EnvFilter directive (e.g. "info", "slotswap_core=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus exporter port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Memory
}

fn default_max_connections() -> u32 {
    5
}

fn default_jwt_secret() -> String {
    "env:SLOTSWAP_JWT_SECRET".to_string()
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_issuer() -> String {
    "slotswap".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_kind(),
            database_url: None,
            max_connections: default_max_connections(),
            auto_migrate: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            issuer: default_issuer(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for ServerConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "slotswap-dev".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: ServerConfigSpec::default(),
        }
    }
}

/// Resolve a value that may be an `env:VAR_NAME` reference.
pub fn resolve_secret(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix("env:") {
        Some(var) => std::env::var(var)
            .map_err(|_| anyhow::anyhow!("environment variable {} is not set", var)),
        None => Ok(value.to_string()),
    }
}

impl ServerConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SLOTSWAP_CONFIG_PATH environment variable
    /// 2. ./slotswap-config.yaml (working directory)
    /// 3. ~/.slotswap/config.yaml (user home)
    /// 4. /etc/slotswap/config.yaml (system, Unix) or C:\ProgramData\SlotSwap\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SLOTSWAP_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./slotswap-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".slotswap").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/slotswap/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\SlotSwap\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SLOTSWAP_DATABASE_URL") {
            if !url.is_empty() {
                tracing::info!("Environment override: SLOTSWAP_DATABASE_URL (backend=postgres)");
                self.spec.storage.backend = StorageKind::Postgres;
                self.spec.storage.database_url = Some(url);
            }
        }

        if let Ok(secret) = std::env::var("SLOTSWAP_JWT_SECRET") {
            if !secret.is_empty() {
                tracing::info!("Environment override: SLOTSWAP_JWT_SECRET");
                self.spec.auth.jwt_secret = secret;
            }
        }

        if let Ok(val) = std::env::var("SLOTSWAP_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: SLOTSWAP_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for SLOTSWAP_PORT: '{}'. Ignoring.", val);
                }
            }
        }
    }

    /// Storage backend with secrets resolved.
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.spec.storage.backend {
            StorageKind::Memory => Ok(StorageBackend::InMemory),
            StorageKind::Postgres => {
                let raw = self
                    .spec
                    .storage
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("spec.storage.database_url is required for postgres"))?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string: resolve_secret(raw)?,
                    max_connections: self.spec.storage.max_connections,
                }))
            }
        }
    }

    /// Token signing secret with `env:` indirection resolved.
    pub fn jwt_secret(&self) -> anyhow::Result<String> {
        let secret = resolve_secret(&self.spec.auth.jwt_secret)?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "spec.auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            );
        }
        Ok(secret)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let storage = &self.spec.storage;
        if storage.backend == StorageKind::Postgres
            && storage.database_url.as_deref().map_or(true, str::is_empty)
        {
            anyhow::bail!("spec.storage.database_url is required when backend is postgres");
        }
        if storage.max_connections == 0 {
            anyhow::bail!("spec.storage.max_connections must be greater than zero");
        }

        let auth = &self.spec.auth;
        match auth.jwt_secret.strip_prefix("env:") {
            Some(var) if var.is_empty() => {
                anyhow::bail!("spec.auth.jwt_secret references an empty variable name")
            }
            Some(_) => {}
            None if auth.jwt_secret.len() < MIN_JWT_SECRET_LEN => anyhow::bail!(
                "spec.auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            ),
            None => {}
        }
        if auth.token_ttl_hours == 0 || auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            anyhow::bail!(
                "spec.auth.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            );
        }

        if self.spec.notifications.channel_capacity == 0 {
            anyhow::bail!("spec.notifications.channel_capacity must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = ServerConfigManifest::default();
        assert_eq!(manifest.api_version, "slotswap.io/v1");
        assert_eq!(manifest.kind, "ServerConfig");
        assert_eq!(manifest.spec.server.port, 8080);
        assert_eq!(manifest.spec.storage.backend, StorageKind::Memory);
        assert_eq!(manifest.spec.auth.jwt_secret, "env:SLOTSWAP_JWT_SECRET");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_sparse_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: slotswap.io/v1
kind: ServerConfig
metadata:
  name: staging
spec:
  server:
    port: 9000
  storage:
    backend: postgres
    database_url: postgres://slotswap@localhost/slotswap
  observability:
    logging:
      format: json
"#;
        let manifest = ServerConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.server.port, 9000);
        assert_eq!(manifest.spec.server.bind_address, "0.0.0.0");
        assert_eq!(manifest.spec.storage.max_connections, 5);
        assert!(manifest.spec.storage.auto_migrate);
        assert_eq!(manifest.spec.observability.logging.format, LogFormat::Json);
        assert_eq!(manifest.spec.notifications.channel_capacity, 1024);
        assert!(manifest.validate().is_ok());

        match manifest.storage_backend().unwrap() {
            StorageBackend::PostgreSQL(pg) => {
                assert_eq!(pg.connection_string, "postgres://slotswap@localhost/slotswap");
                assert_eq!(pg.max_connections, 5);
            }
            other => panic!("unexpected backend: {:?}", other),
        }
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slotswap-config.yaml");

        let mut manifest = ServerConfigManifest::default();
        manifest.metadata.name = "roundtrip".to_string();
        manifest.spec.cors.allowed_origins = vec!["*".to_string()];
        manifest.to_yaml_file(&path).unwrap();

        let loaded = ServerConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.metadata.name, "roundtrip");
        assert_eq!(loaded.spec.cors.allowed_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_validation() {
        let mut manifest = ServerConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.metadata.name = "".to_string();
        assert!(manifest.validate().is_err());
        manifest.metadata.name = "test".to_string();

        manifest.spec.storage.backend = StorageKind::Postgres;
        assert!(manifest.validate().is_err());
        manifest.spec.storage.database_url = Some("postgres://localhost/slotswap".to_string());
        assert!(manifest.validate().is_ok());

        manifest.spec.auth.jwt_secret = "short".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.auth.jwt_secret = "env:".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.auth.jwt_secret = "a-sufficiently-long-secret".to_string();
        assert!(manifest.validate().is_ok());

        manifest.spec.auth.token_ttl_hours = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.auth.token_ttl_hours = 3_000_000_000;
        assert!(manifest.validate().is_err());
        manifest.spec.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(manifest.validate().is_ok());
        manifest.spec.auth.token_ttl_hours = 1;

        manifest.spec.notifications.channel_capacity = 0;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_resolve_secret_reads_environment() {
        std::env::set_var("SLOTSWAP_TEST_RESOLVE_SECRET", "from-the-environment");
        assert_eq!(
            resolve_secret("env:SLOTSWAP_TEST_RESOLVE_SECRET").unwrap(),
            "from-the-environment"
        );
        assert_eq!(resolve_secret("literal").unwrap(), "literal");
        assert!(resolve_secret("env:SLOTSWAP_TEST_DEFINITELY_UNSET").is_err());
    }

    #[test]
    fn test_literal_jwt_secret_length_enforced() {
        let mut manifest = ServerConfigManifest::default();
        manifest.spec.auth.jwt_secret = "0123456789abcdef".to_string();
        assert_eq!(manifest.jwt_secret().unwrap(), "0123456789abcdef");
        manifest.spec.auth.jwt_secret = "0123".to_string();
        assert!(manifest.jwt_secret().is_err());
    }
}

//! Configuration module for docvault.

use serde::Deserialize;
use std::path::Path;

use crate::{DocvaultError, Result};

/// Minimum length for an explicitly configured CSRF secret.
pub const MIN_CSRF_SECRET_LENGTH: usize = 16;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/documents.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Document storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored documents.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum accepted document size in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_bytes: u64,
}

fn default_storage_path() -> String {
    "data/uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_bytes: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file. Console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Web layer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// API key required on `/documents` routes (empty disables the check).
    ///
    /// The HTML page is not covered by the key. Set `serve_ui = false` to
    /// keep documents reachable only through the keyed API.
    #[serde(default)]
    pub api_key: String,
    /// Secret used to sign CSRF tokens (empty = random per process).
    #[serde(default)]
    pub csrf_secret: String,
    /// Rate limit for API endpoints (requests per minute per IP).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    /// Rate limit for upload endpoints (requests per minute per IP).
    #[serde(default = "default_upload_rate_limit")]
    pub upload_rate_limit: u32,
    /// Whether to serve the OpenAPI document and Swagger UI.
    #[serde(default = "default_serve_docs")]
    pub serve_docs: bool,
    /// Whether to serve the HTML upload page (`/`, `/delete/:id`, `/download/:id`).
    #[serde(default = "default_serve_ui")]
    pub serve_ui: bool,
}

fn default_api_rate_limit() -> u32 {
    120
}

fn default_upload_rate_limit() -> u32 {
    30
}

fn default_serve_docs() -> bool {
    true
}

fn default_serve_ui() -> bool {
    true
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            api_key: String::new(),
            csrf_secret: String::new(),
            api_rate_limit: default_api_rate_limit(),
            upload_rate_limit: default_upload_rate_limit(),
            serve_docs: default_serve_docs(),
            serve_ui: default_serve_ui(),
        }
    }
}

/// Orphan reconciliation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Run a sweep once at startup.
    #[serde(default = "default_reconcile_on_startup")]
    pub on_startup: bool,
    /// Files younger than this are never treated as orphans.
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
    /// Only report what would be deleted.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_reconcile_on_startup() -> bool {
    true
}

fn default_grace_period() -> u64 {
    3600
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            on_startup: default_reconcile_on_startup(),
            grace_period_secs: default_grace_period(),
            dry_run: false,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Document storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web layer configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Orphan reconciliation configuration.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DocvaultError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DocvaultError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DOCVAULT_API_KEY`: API key for the `/documents` routes
    /// - `DOCVAULT_CSRF_SECRET`: CSRF signing secret
    /// - `DOCVAULT_MAX_UPLOAD_SIZE_BYTES`: upload size limit
    pub fn apply_env_overrides(&mut self) {
        if let Some(api_key) = non_empty_env("DOCVAULT_API_KEY") {
            self.web.api_key = api_key;
        }
        if let Some(secret) = non_empty_env("DOCVAULT_CSRF_SECRET") {
            self.web.csrf_secret = secret;
        }
        if let Some(max) = non_empty_env("DOCVAULT_MAX_UPLOAD_SIZE_BYTES") {
            match max.parse() {
                Ok(bytes) => self.storage.max_upload_size_bytes = bytes,
                Err(_) => {
                    tracing::warn!(value = %max, "Ignoring invalid DOCVAULT_MAX_UPLOAD_SIZE_BYTES")
                }
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_upload_size_bytes == 0 {
            return Err(DocvaultError::Config(
                "storage.max_upload_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.web.api_rate_limit == 0 || self.web.upload_rate_limit == 0 {
            return Err(DocvaultError::Config(
                "web rate limits must be greater than 0".to_string(),
            ));
        }
        if !self.web.csrf_secret.is_empty() && self.web.csrf_secret.len() < MIN_CSRF_SECRET_LENGTH
        {
            return Err(DocvaultError::Config(format!(
                "web.csrf_secret must be at least {MIN_CSRF_SECRET_LENGTH} bytes. \
                 Leave it empty to use a random per-process secret."
            )));
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

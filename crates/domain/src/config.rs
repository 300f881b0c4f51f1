//! Configuration structures
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration pointed at a local API proxy.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BUCKET_BURST, DEFAULT_BUCKET_QPS,
    DEFAULT_LIST_RETRY_BASE_MS, DEFAULT_LIST_RETRY_MAX_SECS, DEFAULT_LOG_LEVEL, DEFAULT_NAMESPACE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RESYNC_INTERVAL_SECS, DEFAULT_RETRY_LIMIT,
    DEFAULT_SERVER_URL, DEFAULT_SYNC_POLL_INTERVAL_MS, DEFAULT_WORKERS,
};
use crate::errors::{LevelsetError, Result};
use crate::impl_domain_enum_conversions;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub informer: InformerConfig,
    pub controller: ControllerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Check cross-field constraints that serde cannot express
    ///
    /// # Errors
    /// Returns `LevelsetError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.client.server_url).map_err(|e| {
            LevelsetError::Config(format!("client.server_url '{}': {e}", self.client.server_url))
        })?;
        if self.client.request_timeout_secs == 0 {
            return Err(invalid("client.request_timeout_secs", "must be greater than 0"));
        }
        if self.informer.resync_interval_secs == 0 {
            return Err(invalid("informer.resync_interval_secs", "must be greater than 0"));
        }
        if self.informer.list_retry_base_ms == 0 {
            return Err(invalid("informer.list_retry_base_ms", "must be greater than 0"));
        }
        if self.controller.workers == 0 {
            return Err(invalid("controller.workers", "must be at least 1"));
        }
        if self.controller.sync_poll_interval_ms == 0 {
            return Err(invalid("controller.sync_poll_interval_ms", "must be greater than 0"));
        }
        if self.controller.backoff_base() > self.controller.backoff_max() {
            return Err(invalid("controller.backoff_base_ms", "must not exceed backoff_max_secs"));
        }
        if !self.controller.bucket_qps.is_finite() || self.controller.bucket_qps <= 0.0 {
            return Err(invalid("controller.bucket_qps", "must be a positive number"));
        }
        if self.controller.bucket_burst == 0 {
            return Err(invalid("controller.bucket_burst", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> LevelsetError {
    LevelsetError::Config(format!("{field} {message}"))
}

/// Remote API connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API server
    pub server_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// File holding the bearer token, read when `token` is unset
    pub token_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            token_file: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// List loop settings for the local mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InformerConfig {
    /// Namespace to watch; empty watches every namespace
    pub namespace: String,
    /// Interval between full relists
    pub resync_interval_secs: u64,
    /// First delay after a failed list
    pub list_retry_base_ms: u64,
    /// Ceiling for the list retry delay
    pub list_retry_max_secs: u64,
}

impl Default for InformerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            list_retry_base_ms: DEFAULT_LIST_RETRY_BASE_MS,
            list_retry_max_secs: DEFAULT_LIST_RETRY_MAX_SECS,
        }
    }
}

impl InformerConfig {
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn list_retry_base(&self) -> Duration {
        Duration::from_millis(self.list_retry_base_ms)
    }

    pub fn list_retry_max(&self) -> Duration {
        Duration::from_secs(self.list_retry_max_secs)
    }
}

/// Reconciliation controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Number of concurrent worker loops
    pub workers: usize,
    /// Failures tolerated per key before it is dropped
    pub retry_limit: u32,
    /// Reset a key's failure count after a successful reconcile
    pub forget_on_success: bool,
    /// How often the startup barrier checks the mirror
    pub sync_poll_interval_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_secs: u64,
    pub bucket_qps: f64,
    pub bucket_burst: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            retry_limit: DEFAULT_RETRY_LIMIT,
            forget_on_success: true,
            sync_poll_interval_ms: DEFAULT_SYNC_POLL_INTERVAL_MS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            bucket_qps: DEFAULT_BUCKET_QPS,
            bucket_burst: DEFAULT_BUCKET_BURST,
        }
    }
}

impl ControllerConfig {
    pub fn sync_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync_poll_interval_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl_domain_enum_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), format: LogFormat::default() }
    }
}

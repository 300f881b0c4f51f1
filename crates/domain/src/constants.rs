//! Application constants
//!
//! Defaults shared by configuration, the informer and the controller.

// Informer
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_LIST_RETRY_BASE_MS: u64 = 500;
pub const DEFAULT_LIST_RETRY_MAX_SECS: u64 = 30;

// Controller
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_RETRY_LIMIT: u32 = 5;
pub const DEFAULT_SYNC_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 5;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 1000;
pub const DEFAULT_BUCKET_QPS: f64 = 10.0;
pub const DEFAULT_BUCKET_BURST: u32 = 100;

// Client
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "LEVELSET_";

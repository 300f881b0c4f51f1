// Constants for the work queue and its rate limiters
use std::time::Duration;

/// Per-item backoff for the first failure
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5);

/// Per-item backoff ceiling
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1000);

/// Overall token bucket refill rate (tokens per second)
pub const DEFAULT_BUCKET_QPS: f64 = 10.0;

/// Overall token bucket capacity
pub const DEFAULT_BUCKET_BURST: u32 = 100;

/// Maximum exponent for exponential backoff calculation to prevent overflow
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

//! Deduplicating, rate-limited work queue for reconciliation loops
//!
//! A key is held at most once while pending. A key that is re-added while a
//! worker is processing it is delivered again, exactly once, after the
//! worker calls [`WorkQueue::done`]. Failed keys are re-queued through a
//! [`RateLimiter`] that tracks per-key failure counts.

pub mod constants;
pub mod core;
pub mod errors;
pub mod metrics;
pub mod rate_limiter;
pub mod types;

pub use self::core::{DoneGuard, WorkQueue};
pub use errors::{QueueError, QueueResult};
pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use rate_limiter::{
    calculate_exponential_delay, default_controller_rate_limiter, BucketRateLimiter,
    ItemExponentialFailureRateLimiter, MaxOfRateLimiter, RateLimiter,
};
pub use types::{QueueKey, RateLimiterConfig};

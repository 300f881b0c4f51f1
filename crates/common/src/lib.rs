//! Modular common utilities shared across Levelset crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors and error classification
//! - `runtime`: async infrastructure (work queue, rate limiters, clock, crash guard)
//! - `observability`: tracing support (pulled in by `runtime`)
//! - `test-utils`: deterministic clocks and async polling helpers

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod lifecycle;
#[cfg(feature = "runtime")]
pub mod time;
#[cfg(feature = "runtime")]
pub mod workqueue;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "runtime", any(test, feature = "test-utils")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use lifecycle::crash::{guard, panic_message};
#[cfg(feature = "runtime")]
pub use workqueue::{
    default_controller_rate_limiter, BucketRateLimiter, DoneGuard,
    ItemExponentialFailureRateLimiter, MaxOfRateLimiter, QueueError, QueueMetricsSnapshot,
    QueueResult, RateLimiter, RateLimiterConfig, WorkQueue,
};

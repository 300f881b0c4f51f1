use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_BUCKET_BURST, DEFAULT_BUCKET_QPS, DEFAULT_MAX_DELAY,
};

/// Bounds every work queue key must satisfy
///
/// Keys are cloned into the pending, dirty and processing sets and into
/// delayed-add tasks, so they should be cheap to clone.
pub trait QueueKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> QueueKey for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Settings for the default controller rate limiter
///
/// The limiter is the maximum of a per-item exponential backoff and an
/// overall token bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Delay after the first failure of a key
    pub base_delay: Duration,
    /// Ceiling for the per-item delay
    pub max_delay: Duration,
    /// Overall refill rate in tokens per second
    pub qps: f64,
    /// Overall bucket capacity
    pub burst: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            qps: DEFAULT_BUCKET_QPS,
            burst: DEFAULT_BUCKET_BURST,
        }
    }
}

impl RateLimiterConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay > self.max_delay {
            return Err(format!(
                "base_delay ({:?}) must not exceed max_delay ({:?})",
                self.base_delay, self.max_delay
            ));
        }
        if !self.qps.is_finite() || self.qps <= 0.0 {
            return Err(format!("qps must be a positive number, got {}", self.qps));
        }
        if self.burst == 0 {
            return Err("burst must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RateLimiterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_delay, Duration::from_millis(5));
        assert_eq!(config.max_delay, Duration::from_secs(1000));
        assert_eq!(config.burst, 100);
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let config = RateLimiterConfig {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(1),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("base_delay"));
    }

    #[test]
    fn test_validate_rejects_non_positive_qps() {
        for qps in [0.0, -1.0, f64::NAN] {
            let config = RateLimiterConfig { qps, ..Default::default() };
            assert!(config.validate().is_err(), "qps {qps} should be rejected");
        }
    }

    #[test]
    fn test_validate_rejects_zero_burst() {
        let config = RateLimiterConfig { burst: 0, ..Default::default() };
        assert_eq!(config.validate().unwrap_err(), "burst must be greater than 0");
    }
}

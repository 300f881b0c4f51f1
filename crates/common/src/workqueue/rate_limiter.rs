//! Rate limiters that decide how long a failed key waits before requeue
//!
//! Three building blocks are provided:
//! - **Item exponential failure**: per-key backoff doubling on every failure
//! - **Bucket**: an overall token bucket shared by all keys
//! - **Max of**: combines limiters by taking the longest delay
//!
//! [`default_controller_rate_limiter`] combines the first two the way
//! reconciliation controllers usually want them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_BUCKET_BURST, DEFAULT_BUCKET_QPS, DEFAULT_MAX_DELAY,
    MAX_BACKOFF_EXPONENT,
};
use super::errors::{QueueError, QueueResult};
use super::types::{QueueKey, RateLimiterConfig};
use crate::time::{Clock, SystemClock};

/// Decides the requeue delay for a key and tracks its failure count
pub trait RateLimiter<K>: Send + Sync {
    /// Delay before `key` should be processed again
    ///
    /// Counts as one more failure for limiters that track per-key state.
    fn when(&self, key: &K) -> Duration;

    /// Stop tracking `key`, resetting its failure count
    fn forget(&self, key: &K);

    /// Number of failures recorded for `key` since it was last forgotten
    fn num_requeues(&self, key: &K) -> u32;
}

impl<K, R> RateLimiter<K> for Box<R>
where
    R: RateLimiter<K> + ?Sized,
{
    fn when(&self, key: &K) -> Duration {
        (**self).when(key)
    }

    fn forget(&self, key: &K) {
        (**self).forget(key);
    }

    fn num_requeues(&self, key: &K) -> u32 {
        (**self).num_requeues(key)
    }
}

/// Calculate `base * 2^exponent`, capped at `max`
///
/// The multiplication saturates instead of overflowing and the exponent is
/// clamped to [`MAX_BACKOFF_EXPONENT`].
pub fn calculate_exponential_delay(base: Duration, max: Duration, exponent: u32) -> Duration {
    let base_nanos = u64::try_from(base.as_nanos()).unwrap_or(u64::MAX);
    let max_nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);

    let multiplier = 2_u64.saturating_pow(exponent.min(MAX_BACKOFF_EXPONENT));
    Duration::from_nanos(base_nanos.saturating_mul(multiplier).min(max_nanos))
}

/// Per-key exponential backoff: `base * 2^failures`, capped at `max`
pub struct ItemExponentialFailureRateLimiter<K> {
    failures: Mutex<HashMap<K, u32>>,
    base_delay: Duration,
    max_delay: Duration,
}

impl<K: QueueKey> ItemExponentialFailureRateLimiter<K> {
    /// Create a limiter with the given base and ceiling
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self { failures: Mutex::new(HashMap::new()), base_delay, max_delay }
    }
}

impl<K: QueueKey> Default for ItemExponentialFailureRateLimiter<K> {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl<K: QueueKey> RateLimiter<K> for ItemExponentialFailureRateLimiter<K> {
    fn when(&self, key: &K) -> Duration {
        let exponent = {
            let mut failures = self.failures.lock();
            let count = failures.entry(key.clone()).or_insert(0);
            let exponent = *count;
            *count = count.saturating_add(1);
            exponent
        };

        calculate_exponential_delay(self.base_delay, self.max_delay, exponent)
    }

    fn forget(&self, key: &K) {
        self.failures.lock().remove(key);
    }

    fn num_requeues(&self, key: &K) -> u32 {
        self.failures.lock().get(key).copied().unwrap_or(0)
    }
}

struct BucketState {
    tokens: f64,
    last: Instant,
}

/// Overall token bucket limiter shared by every key
///
/// Each call to [`RateLimiter::when`] reserves one token. When the bucket is
/// empty the reservation still succeeds and the returned delay is the time
/// until that token would have been refilled, so callers queue up behind
/// each other at `qps`.
///
/// The limiter keeps no per-key state: `forget` is a no-op and
/// `num_requeues` is always 0.
pub struct BucketRateLimiter<C: Clock = SystemClock> {
    qps: f64,
    burst: u32,
    state: Mutex<BucketState>,
    clock: Arc<C>,
}

impl BucketRateLimiter<SystemClock> {
    /// Create a bucket limiter using the system clock
    pub fn new(qps: f64, burst: u32) -> QueueResult<Self> {
        Self::with_clock(qps, burst, SystemClock)
    }
}

impl<C: Clock> BucketRateLimiter<C> {
    /// Create a bucket limiter with a custom clock
    pub fn with_clock(qps: f64, burst: u32, clock: C) -> QueueResult<Self> {
        if !qps.is_finite() || qps <= 0.0 {
            return Err(QueueError::InvalidConfig(format!("qps must be positive, got {qps}")));
        }
        if burst == 0 {
            return Err(QueueError::InvalidConfig("burst must be greater than 0".to_string()));
        }

        Ok(Self::from_parts(qps, burst, clock))
    }

    fn from_parts(qps: f64, burst: u32, clock: C) -> Self {
        Self {
            qps,
            burst,
            state: Mutex::new(BucketState { tokens: f64::from(burst), last: clock.now() }),
            clock: Arc::new(clock),
        }
    }

    fn reserve(&self) -> Duration {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let elapsed = now.saturating_duration_since(state.last).as_secs_f64();
        state.tokens = elapsed.mul_add(self.qps, state.tokens).min(f64::from(self.burst));
        if now > state.last {
            state.last = now;
        }

        state.tokens -= 1.0;
        if state.tokens >= 0.0 {
            return Duration::ZERO;
        }

        // A tiny qps can push the debt past what a Duration holds.
        let wait = Duration::try_from_secs_f64(-state.tokens / self.qps).unwrap_or(Duration::MAX);
        debug!(wait_ms = wait.as_millis() as u64, "Token bucket exhausted, delaying requeue");
        wait
    }
}

impl<K, C: Clock> RateLimiter<K> for BucketRateLimiter<C> {
    fn when(&self, _key: &K) -> Duration {
        self.reserve()
    }

    fn forget(&self, _key: &K) {}

    fn num_requeues(&self, _key: &K) -> u32 {
        0
    }
}

/// Combines several limiters, using the longest delay any of them returns
pub struct MaxOfRateLimiter<K> {
    limiters: Vec<Box<dyn RateLimiter<K>>>,
}

impl<K: QueueKey> MaxOfRateLimiter<K> {
    /// Create an empty combination; with no children every delay is zero
    pub fn new() -> Self {
        Self { limiters: Vec::new() }
    }

    /// Add a child limiter
    #[must_use]
    pub fn with<R: RateLimiter<K> + 'static>(mut self, limiter: R) -> Self {
        self.limiters.push(Box::new(limiter));
        self
    }
}

impl<K: QueueKey> Default for MaxOfRateLimiter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: QueueKey> RateLimiter<K> for MaxOfRateLimiter<K> {
    fn when(&self, key: &K) -> Duration {
        // Every child must see the failure, so no short-circuiting.
        self.limiters.iter().map(|limiter| limiter.when(key)).max().unwrap_or(Duration::ZERO)
    }

    fn forget(&self, key: &K) {
        for limiter in &self.limiters {
            limiter.forget(key);
        }
    }

    fn num_requeues(&self, key: &K) -> u32 {
        self.limiters.iter().map(|limiter| limiter.num_requeues(key)).max().unwrap_or(0)
    }
}

/// Default controller limiter: max of exponential(5ms, 1000s) and
/// bucket(10 qps, burst 100)
pub fn default_controller_rate_limiter<K: QueueKey>() -> MaxOfRateLimiter<K> {
    MaxOfRateLimiter::new()
        .with(ItemExponentialFailureRateLimiter::<K>::default())
        .with(BucketRateLimiter::from_parts(DEFAULT_BUCKET_QPS, DEFAULT_BUCKET_BURST, SystemClock))
}

impl RateLimiterConfig {
    /// Build the controller limiter described by this configuration
    pub fn build<K: QueueKey>(&self) -> QueueResult<MaxOfRateLimiter<K>> {
        self.validate().map_err(QueueError::InvalidConfig)?;

        Ok(MaxOfRateLimiter::new()
            .with(ItemExponentialFailureRateLimiter::<K>::new(self.base_delay, self.max_delay))
            .with(BucketRateLimiter::new(self.qps, self.burst)?))
    }
}

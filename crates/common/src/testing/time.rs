//! Deterministic clock for tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::time::Clock;

/// Mock clock for deterministic testing
///
/// Starts at the real instant it was created and only moves when told to.
/// Clones share the same elapsed time, so a test can keep one handle and
/// give the other to the code under test.
///
/// ```
/// use std::time::Duration;
///
/// use levelset_common::testing::MockClock;
///
/// let clock = MockClock::new();
/// let handle = clock.clone();
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(handle.elapsed(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock() = duration;
    }

    /// Get the current elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(5));
        clock.advance(Duration::from_millis(500));

        assert_eq!(clock.now().duration_since(start), Duration::from_millis(5500));
    }

    #[test]
    fn test_mock_clock_set_elapsed_replaces() {
        let clock = MockClock::new();
        clock.advance(Duration::from_secs(10));
        clock.set_elapsed(Duration::from_secs(3));
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }
}

//! Time abstraction
//!
//! Rate limiters read the current instant through [`Clock`] so tests can
//! substitute a controllable clock (see `testing::MockClock`) instead of
//! waiting on real time.

use std::time::Instant;

/// Source of monotonic time
pub trait Clock: Send + Sync {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

use std::time::Duration;

use levelset_common::workqueue::calculate_exponential_delay;
use rand::Rng;

/// Delay before the next list attempt after consecutive failures
///
/// Exponential in the failure count, capped at `max`, with the upper half
/// randomised so several processes do not relist in lockstep.
#[derive(Debug, Clone, Copy)]
pub struct ListBackoff {
    base: Duration,
    max: Duration,
}

impl ListBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Upper bound for the delay after `failures` consecutive failures
    pub fn ceiling(&self, failures: u32) -> Duration {
        calculate_exponential_delay(self.base, self.max, failures.saturating_sub(1))
    }

    pub fn delay(&self, failures: u32) -> Duration {
        let ceiling = self.ceiling(failures);
        ceiling.mul_f64(rand::thread_rng().gen_range(0.5..=1.0))
    }
}

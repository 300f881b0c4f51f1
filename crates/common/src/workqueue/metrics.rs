use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

/// Work queue metrics for monitoring
#[derive(Debug, Default)]
pub struct QueueMetrics {
    pub total_adds: AtomicU64,
    pub deduplicated_adds: AtomicU64,
    pub delayed_adds: AtomicU64,
    pub total_gets: AtomicU64,
    pub total_done: AtomicU64,
    pub total_retries: AtomicU64,
    pub current_depth: AtomicUsize,
    pub queue_depth_max: AtomicUsize,
}

impl QueueMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key entering the dirty set
    pub fn record_add(&self) {
        self.total_adds.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record an add collapsed into an already pending key
    pub fn record_deduplication(&self) {
        self.deduplicated_adds.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a delayed add being scheduled
    pub fn record_delayed(&self) {
        self.delayed_adds.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a key handed to a worker
    pub fn record_get(&self) {
        self.total_gets.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a worker finishing a key
    pub fn record_done(&self) {
        self.total_done.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a rate-limited requeue
    pub fn record_retry(&self) {
        self.total_retries.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Update current depth
    pub fn update_depth(&self, depth: usize) {
        self.current_depth.store(depth, AtomicOrdering::Relaxed);
        self.update_max_depth(depth);
    }

    /// Update maximum depth if current exceeds it
    fn update_max_depth(&self, current: usize) {
        let mut max = self.queue_depth_max.load(AtomicOrdering::Relaxed);

        while current > max {
            match self.queue_depth_max.compare_exchange_weak(
                max,
                current,
                AtomicOrdering::Relaxed,
                AtomicOrdering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }

    /// Get a snapshot of metrics
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            total_adds: self.total_adds.load(AtomicOrdering::Relaxed),
            deduplicated_adds: self.deduplicated_adds.load(AtomicOrdering::Relaxed),
            delayed_adds: self.delayed_adds.load(AtomicOrdering::Relaxed),
            total_gets: self.total_gets.load(AtomicOrdering::Relaxed),
            total_done: self.total_done.load(AtomicOrdering::Relaxed),
            total_retries: self.total_retries.load(AtomicOrdering::Relaxed),
            current_depth: self.current_depth.load(AtomicOrdering::Relaxed),
            queue_depth_max: self.queue_depth_max.load(AtomicOrdering::Relaxed),
        }
    }
}

/// Immutable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMetricsSnapshot {
    pub total_adds: u64,
    pub deduplicated_adds: u64,
    pub delayed_adds: u64,
    pub total_gets: u64,
    pub total_done: u64,
    pub total_retries: u64,
    pub current_depth: usize,
    pub queue_depth_max: usize,
}

impl QueueMetricsSnapshot {
    /// Keys handed out but not yet marked done
    pub fn in_flight(&self) -> u64 {
        self.total_gets.saturating_sub(self.total_done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_depth_only_grows() {
        let metrics = QueueMetrics::new();
        metrics.update_depth(3);
        metrics.update_depth(7);
        metrics.update_depth(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.current_depth, 2);
        assert_eq!(snapshot.queue_depth_max, 7);
    }

    #[test]
    fn test_snapshot_serializes_counters() {
        let metrics = QueueMetrics::new();
        metrics.record_add();
        metrics.record_get();
        metrics.record_retry();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.in_flight(), 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["total_adds"], 1);
        assert_eq!(json["total_retries"], 1);
    }
}

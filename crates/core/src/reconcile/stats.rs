use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters for reconcile outcomes and rejected notifications
#[derive(Debug, Default)]
pub struct ControllerStats {
    reconciled: AtomicU64,
    requeued: AtomicU64,
    dropped: AtomicU64,
    malformed: AtomicU64,
}

impl ControllerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_reconciled(&self) {
        self.reconciled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_requeued(&self) {
        self.requeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ControllerStatsSnapshot {
        ControllerStatsSnapshot {
            reconciled: self.reconciled.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ControllerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatsSnapshot {
    /// Successful reconciles
    pub reconciled: u64,
    /// Failures that were requeued with backoff
    pub requeued: u64,
    /// Keys given up on after exhausting the retry limit
    pub dropped: u64,
    /// Notifications that could not be turned into a key
    pub malformed: u64,
}

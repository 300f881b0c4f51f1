use levelset_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use levelset_common::workqueue::QueueError;
use levelset_domain::LevelsetError;
use thiserror::Error;

/// Failure of a single reconcile attempt
///
/// Every variant is treated as transient: the key is requeued until the
/// retry limit is reached.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("reconcile failed: {0}")]
    Failed(String),

    #[error("mirror lookup failed: {0}")]
    Lookup(#[from] LevelsetError),

    #[error("reconcile panicked: {0}")]
    Panicked(String),
}

impl ReconcileError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl ErrorClassification for ReconcileError {
    fn is_retryable(&self) -> bool {
        true
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Failed(_) | Self::Lookup(_) => ErrorSeverity::Warning,
            Self::Panicked(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

/// Fatal controller failures returned from `Controller::run`
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Stop fired before the mirror finished its initial sync
    #[error("timed out waiting for caches to sync")]
    CacheSyncFailed,

    /// The controller body panicked
    #[error("controller crashed: {0}")]
    Crashed(#[source] CommonError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

use thiserror::Error;

/// Work queue errors
///
/// Queue operations themselves never fail: `add` and friends are ignored
/// after shutdown and `get` signals shutdown with `None`. Errors only arise
/// while building a queue or a rate limiter from configuration.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid rate limiter configuration: {0}")]
    InvalidConfig(String),
}

/// Queue operation result type
pub type QueueResult<T> = Result<T, QueueError>;

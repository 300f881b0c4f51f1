//! Remote API error types

use std::time::Duration;

use levelset_common::error::{ErrorClassification, ErrorSeverity};
use levelset_domain::LevelsetError;
use reqwest::StatusCode;
use thiserror::Error;

use crate::errors::InfraError;

/// Failures talking to the remote API
#[derive(Debug, Error)]
pub enum ClientError {
    /// 401 or 403
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 429
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// 5xx
    #[error("Server error: {0}")]
    Server(String),

    /// Any other 4xx
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit(message),
            s if s.is_server_error() => Self::Server(message),
            s if s.is_client_error() => Self::Rejected(message),
            _ => Self::Network(message),
        }
    }
}

impl ErrorClassification for ClientError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit(_) | Self::Server(_) | Self::Network(_) | Self::Timeout(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RateLimit(_) | Self::Server(_) | Self::Network(_) | Self::Timeout(_) => {
                ErrorSeverity::Warning
            }
            Self::NotFound(_) | Self::Rejected(_) | Self::Decode(_) => ErrorSeverity::Error,
            Self::Auth(_) | Self::Config(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Config(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit(_) => Some(Duration::from_secs(5)),
            Self::Server(_) | Self::Network(_) | Self::Timeout(_) => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

impl From<LevelsetError> for ClientError {
    fn from(err: LevelsetError) -> Self {
        match err {
            LevelsetError::Auth(message) => Self::Auth(message),
            LevelsetError::NotFound(message) => Self::NotFound(message),
            LevelsetError::Network(message) => Self::Network(message),
            LevelsetError::Config(message) => Self::Config(message),
            LevelsetError::InvalidInput(message) | LevelsetError::Malformed(message) => {
                Self::Decode(message)
            }
            LevelsetError::Internal(message) => Self::Server(message),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        LevelsetError::from(InfraError::from(err)).into()
    }
}

impl From<ClientError> for LevelsetError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Auth(message) => Self::Auth(message),
            ClientError::NotFound(message) => Self::NotFound(message),
            ClientError::Rejected(message) | ClientError::Decode(message) => {
                Self::InvalidInput(message)
            }
            ClientError::Config(message) => Self::Config(message),
            ClientError::RateLimit(_)
            | ClientError::Server(_)
            | ClientError::Network(_)
            | ClientError::Timeout(_) => Self::Network(err.to_string()),
        }
    }
}

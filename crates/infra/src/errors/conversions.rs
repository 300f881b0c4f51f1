//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use levelset_domain::LevelsetError;
use reqwest::Error as HttpError;

/// Wraps a domain error produced from an infrastructure failure
#[derive(Debug)]
pub struct InfraError(pub LevelsetError);

impl From<InfraError> for LevelsetError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LevelsetError> for InfraError {
    fn from(value: LevelsetError) -> Self {
        Self(value)
    }
}

trait IntoLevelsetError {
    fn into_levelset(self) -> LevelsetError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LevelsetError */
/* -------------------------------------------------------------------------- */

impl IntoLevelsetError for HttpError {
    fn into_levelset(self) -> LevelsetError {
        if self.is_timeout() {
            return LevelsetError::Network("HTTP request timed out".into());
        }
        if self.is_connect() {
            return LevelsetError::Network(format!("HTTP connection failure: {self}"));
        }
        if self.is_decode() {
            return LevelsetError::InvalidInput(format!("HTTP response body malformed: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {code} {}", status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => LevelsetError::Auth(message),
                404 => LevelsetError::NotFound(message),
                400..=499 if code != 429 => LevelsetError::InvalidInput(message),
                _ => LevelsetError::Network(message),
            };
        }

        LevelsetError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_levelset())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → LevelsetError */
/* -------------------------------------------------------------------------- */

impl IntoLevelsetError for IoError {
    fn into_levelset(self) -> LevelsetError {
        match self.kind() {
            ErrorKind::NotFound => LevelsetError::NotFound(self.to_string()),
            ErrorKind::PermissionDenied => LevelsetError::Auth(self.to_string()),
            _ => LevelsetError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_levelset())
    }
}

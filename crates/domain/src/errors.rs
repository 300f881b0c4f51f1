//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Levelset
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LevelsetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A notification or key that cannot be turned into a resource key
    #[error("Malformed object: {0}")]
    Malformed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Levelset operations
pub type Result<T> = std::result::Result<T, LevelsetError>;

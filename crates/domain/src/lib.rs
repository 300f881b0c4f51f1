//! # Levelset Domain
//!
//! Domain types shared by every Levelset crate.
//!
//! This crate contains:
//! - Resource objects, resource keys and deletion notifications
//! - Key functions that turn notifications into queue keys
//! - Domain error types and Result definitions
//! - Configuration structures and their defaults
//!
//! ## Architecture
//! - No dependencies on other Levelset crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

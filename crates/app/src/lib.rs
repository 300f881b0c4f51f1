//! # Levelset Application
//!
//! Wires the API client, informer and reconciliation controller into one
//! process with a single stop signal.

pub mod cli;
pub mod context;

pub use cli::Cli;
pub use context::{AppContext, AppError};

//! Lifecycle utilities for long-running async components
//!
//! - **[`crash`]**: turns panics inside a task body into logged errors

pub mod crash;

pub use crash::{guard, panic_message};

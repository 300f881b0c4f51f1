//! Observability setup
//!
//! Installs the process-wide `tracing` subscriber. Everything else in the
//! workspace logs through `tracing` macros with structured fields.

pub mod logging;

pub use logging::{build_filter, init_tracing};

//! Level-triggered reconciliation engine
//!
//! - **[`ports`]**: traits for the mirror, notifier and reconcile step
//! - **[`controller`]**: queue wiring, worker pool and retry policy
//! - **[`handler`]**: notification handler that enqueues keys
//! - **[`lookup`]**: sample reconcile step

pub mod controller;
pub mod error;
pub mod handler;
pub mod lookup;
pub mod ports;
pub mod stats;

pub use controller::Controller;
pub use error::{ControllerError, ReconcileError};
pub use handler::QueueingHandler;
pub use lookup::LookupReconciler;
pub use ports::{EventSource, Mirror, Reconciler, ResourceEventHandler};
pub use stats::{ControllerStats, ControllerStatsSnapshot};

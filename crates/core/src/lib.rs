//! # Levelset Core
//!
//! Reconciliation logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the mirror, notifier and reconcile step
//! - The reconciliation controller and its worker loop
//! - A sample reconcile step
//!
//! ## Architecture Principles
//! - Only depends on `levelset-common` and `levelset-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod reconcile;

pub use reconcile::{
    Controller, ControllerError, ControllerStatsSnapshot, EventSource, LookupReconciler, Mirror,
    ReconcileError, Reconciler, ResourceEventHandler,
};

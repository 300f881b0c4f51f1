//! # Levelset Infrastructure
//!
//! Implementations of the controller's ports against a remote
//! Kubernetes-style API, plus process-level plumbing.
//!
//! - [`client`]: HTTP client and credentials
//! - [`informer`]: list loop, local mirror and change notifications
//! - [`config`]: configuration loading from environment and files
//! - [`observability`]: tracing subscriber setup

pub mod client;
pub mod config;
pub mod errors;
pub mod informer;
pub mod observability;

pub use client::{ApiClient, ClientError, Credentials, ListSource};
pub use errors::InfraError;
pub use informer::{Informer, MirrorStore};
pub use observability::init_tracing;

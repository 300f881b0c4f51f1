//! Local mirror of a remote resource collection and its change notifier

pub mod backoff;
pub mod informer;
pub mod store;

pub use backoff::ListBackoff;
pub use informer::Informer;
pub use store::{MirrorStore, ReplaceDelta};

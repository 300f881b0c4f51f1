//! Port interfaces for the reconciliation loop
//!
//! The controller only sees the outside world through these traits. The
//! infra crate implements [`Mirror`] and [`EventSource`] on top of the
//! remote API; applications implement [`Reconciler`].

use std::sync::Arc;

use async_trait::async_trait;
use levelset_domain::{DeletedObject, Resource, ResourceKey, Result};

use super::error::ReconcileError;

/// Locally cached replica of a remote resource collection
pub trait Mirror: Send + Sync {
    /// Whether the initial full list has been applied
    fn has_synced(&self) -> bool;

    /// Current cached state of `key`, `None` if it is not (or no longer)
    /// present
    fn get_by_key(&self, key: &ResourceKey) -> Result<Option<Resource>>;
}

/// Receives change notifications from an [`EventSource`]
///
/// Callbacks run on the notifier's task and must not block.
pub trait ResourceEventHandler: Send + Sync {
    fn on_add(&self, object: &Resource);

    /// Delivered for real changes and for periodic resyncs alike
    fn on_update(&self, old: &Resource, new: &Resource);

    fn on_delete(&self, deleted: &DeletedObject);
}

/// Emits add/update/delete notifications as the mirror changes
pub trait EventSource: Send + Sync {
    /// Register a handler for all future notifications
    fn add_event_handler(&self, handler: Arc<dyn ResourceEventHandler>);
}

/// User-defined reconcile step
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Drive `key` towards its desired state
    ///
    /// `object` is the mirror's current state, `None` when the object has
    /// been deleted. Returning an error requeues the key with backoff.
    async fn reconcile(
        &self,
        key: &ResourceKey,
        object: Option<Resource>,
    ) -> std::result::Result<(), ReconcileError>;
}

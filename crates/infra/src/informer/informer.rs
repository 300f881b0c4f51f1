//! List-driven informer
//!
//! Keeps a [`MirrorStore`] in step with the remote collection by relisting
//! it every resync interval. Each list is diffed against the store:
//! new objects are delivered as adds, every surviving object as an update
//! (changed or not) and vanished objects as tombstone deletes, because the
//! final state of a vanished object was never observed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use levelset_common::error::{ErrorClassification, ErrorSeverity};
use levelset_core::{EventSource, Mirror, ResourceEventHandler};
use levelset_domain::{
    meta_namespace_key_func, DeletedObject, InformerConfig, Resource, ResourceKey,
};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backoff::ListBackoff;
use super::store::{MirrorStore, ReplaceDelta};
use crate::client::{ClientError, ListSource};

/// Mirror plus notifier for one resource collection
pub struct Informer {
    source: Arc<dyn ListSource>,
    store: Arc<MirrorStore>,
    handlers: RwLock<Vec<Arc<dyn ResourceEventHandler>>>,
    namespace: String,
    resync_interval: Duration,
    backoff: ListBackoff,
}

impl Informer {
    pub fn new(source: Arc<dyn ListSource>, config: &InformerConfig) -> Self {
        Self {
            source,
            store: Arc::new(MirrorStore::new()),
            handlers: RwLock::new(Vec::new()),
            namespace: config.namespace.clone(),
            resync_interval: config.resync_interval(),
            backoff: ListBackoff::new(config.list_retry_base(), config.list_retry_max()),
        }
    }

    pub fn store(&self) -> Arc<MirrorStore> {
        Arc::clone(&self.store)
    }

    /// The store as the controller's lookup port
    pub fn mirror(&self) -> Arc<dyn Mirror> {
        self.store()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn has_synced(&self) -> bool {
        self.store.has_synced()
    }

    /// List and resync until `stop` fires
    ///
    /// A retryable list failure is retried with jittered exponential
    /// backoff. A failure that retrying will not fix (rejected credentials,
    /// an undecodable body) waits the full resync interval instead.
    pub async fn run(self: Arc<Self>, stop: CancellationToken) {
        info!(
            namespace = %self.namespace,
            resync_secs = self.resync_interval.as_secs(),
            "Starting informer"
        );

        let mut failures: u32 = 0;
        loop {
            let delay = tokio::select! {
                biased;
                () = stop.cancelled() => break,
                result = self.sync_once() => match result {
                    Ok(_) => {
                        failures = 0;
                        self.resync_interval
                    }
                    Err(err) => {
                        failures = failures.saturating_add(1);
                        self.retry_delay(&err, failures)
                    }
                },
            };

            tokio::select! {
                biased;
                () = stop.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        info!(namespace = %self.namespace, "Informer stopped");
    }

    fn retry_delay(&self, err: &ClientError, failures: u32) -> Duration {
        if err.is_retryable() {
            let delay = self.backoff.delay(failures);
            warn!(error = %err, failures, retry_in = ?delay, "Failed to list resources");
            return delay;
        }

        let delay = self.resync_interval;
        if err.severity() >= ErrorSeverity::Critical {
            error!(error = %err, retry_in = ?delay, "Listing rejected, waiting for next resync");
        } else {
            warn!(error = %err, retry_in = ?delay, "Listing failed, waiting for next resync");
        }
        delay
    }

    /// List once, replace the store contents and notify every handler
    ///
    /// The store is marked synced after the first successful list has been
    /// delivered.
    ///
    /// # Errors
    /// Returns the list error; the store is left untouched.
    pub async fn sync_once(&self) -> Result<ReplaceDelta, ClientError> {
        let list = self.source.list(&self.namespace).await?;
        let items = index(list.items);

        // Holding the handler list across replace and dispatch keeps a
        // concurrent registration from missing the first delivery.
        let handlers = self.handlers.read();
        let delta = self.store.replace(items);
        dispatch(&handlers, &delta);
        self.store.mark_synced();
        drop(handlers);

        debug!(
            resource_version = %list.metadata.resource_version,
            added = delta.added.len(),
            updated = delta.updated.len(),
            changed = delta.changed(),
            removed = delta.removed.len(),
            "Applied resource list"
        );
        Ok(delta)
    }
}

fn index(items: Vec<Resource>) -> BTreeMap<ResourceKey, Resource> {
    items
        .into_iter()
        .filter_map(|item| match meta_namespace_key_func(&item) {
            Ok(key) => Some((key, item)),
            Err(err) => {
                warn!(error = %err, "Skipping listed object without a usable key");
                None
            }
        })
        .collect()
}

fn dispatch(handlers: &[Arc<dyn ResourceEventHandler>], delta: &ReplaceDelta) {
    for handler in handlers {
        for object in &delta.added {
            handler.on_add(object);
        }
        for (old, new) in &delta.updated {
            handler.on_update(old, new);
        }
        for (key, last_known) in &delta.removed {
            handler.on_delete(&DeletedObject::tombstone(key, Some(last_known.clone())));
        }
    }
}

impl EventSource for Informer {
    /// Register `handler`; if the store has synced, it first receives an add
    /// for every object already present
    fn add_event_handler(&self, handler: Arc<dyn ResourceEventHandler>) {
        let mut handlers = self.handlers.write();
        if self.store.has_synced() {
            for object in self.store.list() {
                handler.on_add(&object);
            }
        }
        handlers.push(handler);
    }
}

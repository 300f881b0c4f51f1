//! Notification handler that turns mirror changes into queue keys

use std::sync::Arc;

use levelset_common::workqueue::WorkQueue;
use levelset_domain::{
    deletion_handling_key_func, meta_namespace_key_func, DeletedObject, Resource, ResourceKey,
    Result,
};
use tracing::{trace, warn};

use super::ports::ResourceEventHandler;
use super::stats::ControllerStats;

/// Enqueues the key of every notified object
///
/// Updates are not diffed: every update, including periodic resyncs,
/// enqueues the key. Notifications whose key cannot be computed are logged,
/// counted and dropped.
pub struct QueueingHandler {
    queue: WorkQueue<ResourceKey>,
    stats: Arc<ControllerStats>,
}

impl QueueingHandler {
    pub fn new(queue: WorkQueue<ResourceKey>, stats: Arc<ControllerStats>) -> Self {
        Self { queue, stats }
    }

    fn enqueue(&self, event: &'static str, key: Result<ResourceKey>) {
        match key {
            Ok(key) => {
                trace!(event, %key, "Enqueueing key");
                self.queue.add(key);
            }
            Err(err) => {
                warn!(event, error = %err, "Dropping notification without a usable key");
                self.stats.record_malformed();
            }
        }
    }
}

impl ResourceEventHandler for QueueingHandler {
    fn on_add(&self, object: &Resource) {
        self.enqueue("add", meta_namespace_key_func(object));
    }

    fn on_update(&self, _old: &Resource, new: &Resource) {
        self.enqueue("update", meta_namespace_key_func(new));
    }

    fn on_delete(&self, deleted: &DeletedObject) {
        self.enqueue("delete", deletion_handling_key_func(deleted));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> (QueueingHandler, WorkQueue<ResourceKey>, Arc<ControllerStats>) {
        let queue = WorkQueue::with_default_rate_limiter("handler-test");
        let stats = Arc::new(ControllerStats::new());
        (QueueingHandler::new(queue.clone(), stats.clone()), queue, stats)
    }

    #[test]
    fn test_add_and_update_collapse_to_one_key() {
        let (handler, queue, _) = handler();
        let old = Resource::named("ns", "a").with_resource_version("1");
        let new = Resource::named("ns", "a").with_resource_version("2");

        handler.on_add(&old);
        handler.on_update(&old, &new);

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_tombstone_delete_enqueues() {
        let (handler, queue, stats) = handler();
        let key = ResourceKey::new("ns", "gone").unwrap();

        handler.on_delete(&DeletedObject::tombstone(&key, None));

        assert_eq!(queue.len(), 1);
        assert_eq!(stats.snapshot().malformed, 0);
    }

    #[test]
    fn test_malformed_notification_counted_not_enqueued() {
        let (handler, queue, stats) = handler();

        handler.on_add(&Resource::named("ns", ""));
        handler.on_delete(&DeletedObject::Tombstone { key: "a/b/c".to_string(), last_known: None });

        assert!(queue.is_empty());
        assert_eq!(stats.snapshot().malformed, 2);
    }
}

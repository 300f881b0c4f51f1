use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::metrics::{QueueMetrics, QueueMetricsSnapshot};
use super::rate_limiter::{default_controller_rate_limiter, RateLimiter};
use super::types::{QueueKey, RateLimiterConfig};
use super::QueueResult;

/// Membership sets behind the queue lock
///
/// `dirty` holds every key that needs processing, `processing` every key a
/// worker currently owns, and `queue` the order in which dirty keys that are
/// not being processed will be handed out. A key is in `queue` only if it is
/// in `dirty` and not in `processing`.
struct QueueState<K> {
    queue: VecDeque<K>,
    dirty: HashSet<K>,
    processing: HashSet<K>,
    shutting_down: bool,
}

impl<K> Default for QueueState<K> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            dirty: HashSet::new(),
            processing: HashSet::new(),
            shutting_down: false,
        }
    }
}

struct Inner<K> {
    name: String,
    state: Mutex<QueueState<K>>,
    notify: Notify,
    shutdown: CancellationToken,
    rate_limiter: Box<dyn RateLimiter<K>>,
    metrics: QueueMetrics,
}

/// Deduplicating, rate-limited FIFO of keys
///
/// ## Guarantees
///
/// - A key is never pending twice. Adding a pending key is a no-op.
/// - A key is never handed to two workers at once. Adding a key that is
///   being processed marks it dirty, and [`WorkQueue::done`] puts it back
///   in the queue exactly once.
/// - After [`WorkQueue::shut_down`], new adds are ignored, pending delayed
///   adds are dropped, and [`WorkQueue::get`] drains what is left before
///   returning `None`.
///
/// Every key returned by `get` must be passed to `done` exactly once.
/// [`WorkQueue::guard`] returns a [`DoneGuard`] that does this on drop.
///
/// The queue is a cheap handle: clones share the same state.
pub struct WorkQueue<K> {
    inner: Arc<Inner<K>>,
}

impl<K> Clone for WorkQueue<K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K> fmt::Debug for WorkQueue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.inner.name)
            .field("metrics", &self.inner.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

impl<K: QueueKey> WorkQueue<K> {
    /// Create a queue using the given rate limiter for `add_rate_limited`
    pub fn new<R>(name: impl Into<String>, rate_limiter: R) -> Self
    where
        R: RateLimiter<K> + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state: Mutex::new(QueueState::default()),
                notify: Notify::new(),
                shutdown: CancellationToken::new(),
                rate_limiter: Box::new(rate_limiter),
                metrics: QueueMetrics::new(),
            }),
        }
    }

    /// Create a queue with the default controller rate limiter
    pub fn with_default_rate_limiter(name: impl Into<String>) -> Self {
        Self::new(name, default_controller_rate_limiter::<K>())
    }

    /// Create a queue with a controller rate limiter built from `config`
    pub fn with_config(name: impl Into<String>, config: &RateLimiterConfig) -> QueueResult<Self> {
        Ok(Self::new(name, config.build::<K>()?))
    }

    /// Queue name used in log fields
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Mark `key` as needing processing
    ///
    /// Never blocks. Ignored after shutdown.
    pub fn add(&self, key: K) {
        let mut state = self.inner.state.lock();
        if state.shutting_down {
            trace!(queue = %self.inner.name, ?key, "Ignoring add after shutdown");
            return;
        }

        if !state.dirty.insert(key.clone()) {
            self.inner.metrics.record_deduplication();
            trace!(queue = %self.inner.name, ?key, "Key already pending");
            return;
        }
        self.inner.metrics.record_add();

        if state.processing.contains(&key) {
            debug!(queue = %self.inner.name, ?key, "Key in flight, will redeliver after done");
            return;
        }

        state.queue.push_back(key);
        self.inner.metrics.update_depth(state.queue.len());
        drop(state);

        self.inner.notify.notify_one();
    }

    /// Add `key` once `delay` has elapsed
    ///
    /// A zero delay adds immediately. The timer is dropped if the queue
    /// shuts down first. Outside a tokio runtime the key is added
    /// immediately.
    pub fn add_after(&self, key: K, delay: Duration) {
        if self.is_shutting_down() {
            return;
        }
        if delay.is_zero() {
            self.add(key);
            return;
        }

        match Handle::try_current() {
            Ok(runtime) => {
                self.inner.metrics.record_delayed();
                let queue = self.clone();
                let shutdown = self.inner.shutdown.clone();
                runtime.spawn(async move {
                    tokio::select! {
                        () = shutdown.cancelled() => {
                            trace!(queue = %queue.inner.name, ?key, "Dropping delayed add at shutdown");
                        }
                        () = tokio::time::sleep(delay) => queue.add(key),
                    }
                });
            }
            Err(_) => {
                warn!(
                    queue = %self.inner.name,
                    ?key,
                    delay_ms = delay.as_millis() as u64,
                    "No tokio runtime for delayed add, adding immediately"
                );
                self.add(key);
            }
        }
    }

    /// Add `key` after the delay chosen by the rate limiter
    ///
    /// Counts as one more requeue of `key`.
    pub fn add_rate_limited(&self, key: K) {
        let delay = self.inner.rate_limiter.when(&key);
        self.inner.metrics.record_retry();
        debug!(
            queue = %self.inner.name,
            ?key,
            delay_ms = delay.as_millis() as u64,
            "Requeueing with rate limit"
        );
        self.add_after(key, delay);
    }

    /// Reset the requeue count of `key`; queue membership is unaffected
    pub fn forget(&self, key: &K) {
        self.inner.rate_limiter.forget(key);
    }

    /// Requeues of `key` since it was last forgotten
    pub fn num_requeues(&self, key: &K) -> u32 {
        self.inner.rate_limiter.num_requeues(key)
    }

    /// Wait for the next key
    ///
    /// Returns `None` once the queue is shut down and drained. The returned
    /// key is owned by the caller until it is passed to [`WorkQueue::done`].
    #[instrument(level = "trace", skip(self), fields(queue = %self.inner.name))]
    pub async fn get(&self) -> Option<K> {
        loop {
            // Register interest before inspecting state so a notify between
            // the check and the await is not lost.
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.inner.state.lock();
                if let Some(key) = state.queue.pop_front() {
                    state.processing.insert(key.clone());
                    state.dirty.remove(&key);
                    self.inner.metrics.record_get();
                    self.inner.metrics.update_depth(state.queue.len());

                    // Hand any leftover wakeup to the next waiter.
                    if !state.queue.is_empty() {
                        self.inner.notify.notify_one();
                    }
                    return Some(key);
                }

                if state.shutting_down {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Finish processing `key`
    ///
    /// If `key` was added while it was being processed it becomes pending
    /// again.
    pub fn done(&self, key: &K) {
        let mut state = self.inner.state.lock();
        if !state.processing.remove(key) {
            warn!(queue = %self.inner.name, ?key, "done called for a key that was not in flight");
            return;
        }
        self.inner.metrics.record_done();

        if state.dirty.contains(key) {
            state.queue.push_back(key.clone());
            self.inner.metrics.update_depth(state.queue.len());
            drop(state);
            self.inner.notify.notify_one();
        }
    }

    /// Scope `key` to a guard that calls [`WorkQueue::done`] on drop
    pub fn guard(&self, key: K) -> DoneGuard<K> {
        DoneGuard { queue: self.clone(), key }
    }

    /// Stop accepting keys and wake every waiter
    ///
    /// Idempotent. Keys still pending are drained by `get` before it
    /// returns `None`.
    pub fn shut_down(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.shutting_down {
                return;
            }
            state.shutting_down = true;
            info!(
                queue = %self.inner.name,
                pending = state.queue.len(),
                in_flight = state.processing.len(),
                "Shutting down work queue"
            );
        }

        self.inner.shutdown.cancel();
        self.inner.notify.notify_waiters();
    }

    /// Whether [`WorkQueue::shut_down`] has been called
    pub fn is_shutting_down(&self) -> bool {
        self.inner.state.lock().shutting_down
    }

    /// Number of keys waiting to be handed out
    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Whether no key is waiting to be handed out
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of queue counters
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

/// Calls [`WorkQueue::done`] for its key when dropped
///
/// Holding one of these for the whole time a key is processed makes the
/// `get`/`done` pairing hold on early returns and panics alike.
#[must_use = "dropping the guard immediately marks the key done"]
pub struct DoneGuard<K: QueueKey> {
    queue: WorkQueue<K>,
    key: K,
}

impl<K: QueueKey> DoneGuard<K> {
    /// The key being processed
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: QueueKey> Drop for DoneGuard<K> {
    fn drop(&mut self) {
        self.queue.done(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workqueue::ItemExponentialFailureRateLimiter;

    fn queue() -> WorkQueue<String> {
        WorkQueue::new(
            "test",
            ItemExponentialFailureRateLimiter::new(
                Duration::from_millis(5),
                Duration::from_millis(40),
            ),
        )
    }

    #[tokio::test]
    async fn test_single_add_single_get() {
        let q = queue();
        q.add("ns/a".to_string());

        assert_eq!(q.get().await.as_deref(), Some("ns/a"));
        assert!(q.is_empty());
        q.done(&"ns/a".to_string());
        assert_eq!(q.metrics().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_adds_collapse() {
        let q = queue();
        q.add("ns/a".to_string());
        q.add("ns/a".to_string());
        q.add("ns/b".to_string());

        assert_eq!(q.len(), 2);
        let metrics = q.metrics();
        assert_eq!(metrics.total_adds, 2);
        assert_eq!(metrics.deduplicated_adds, 1);
    }

    #[tokio::test]
    async fn test_readd_while_processing_redelivers_once_after_done() {
        let q = queue();
        let key = "ns/a".to_string();
        q.add(key.clone());

        let got = q.get().await.unwrap();
        q.add(key.clone());
        q.add(key.clone());
        assert!(q.is_empty(), "in-flight key must not be pending");

        q.done(&got);
        assert_eq!(q.len(), 1);
        assert_eq!(q.get().await.as_deref(), Some("ns/a"));
        q.done(&key);
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn test_done_guard_marks_done_on_drop() {
        let q = queue();
        q.add("ns/a".to_string());

        {
            let guard = q.guard(q.get().await.unwrap());
            assert_eq!(guard.key(), "ns/a");
            q.add("ns/a".to_string());
        }

        assert_eq!(q.len(), 1);
        assert_eq!(q.metrics().total_done, 1);
    }

    #[tokio::test]
    async fn test_forget_resets_requeue_count() {
        let q = queue();
        let key = "ns/a".to_string();
        for _ in 0..3 {
            q.add_rate_limited(key.clone());
        }
        assert_eq!(q.num_requeues(&key), 3);

        q.forget(&key);
        assert_eq!(q.num_requeues(&key), 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_then_returns_none() {
        let q = queue();
        q.add("ns/a".to_string());
        q.shut_down();
        q.shut_down();

        q.add("ns/b".to_string());
        assert_eq!(q.get().await.as_deref(), Some("ns/a"));
        assert_eq!(q.get().await, None);
        assert_eq!(q.get().await, None);
    }

    #[tokio::test]
    async fn test_shutdown_wakes_blocked_getters() {
        let q = queue();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let q = q.clone();
                tokio::spawn(async move { q.get().await })
            })
            .collect();

        tokio::task::yield_now().await;
        q.shut_down();

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_after_waits_for_delay() {
        let q = queue();
        q.add_after("ns/a".to_string(), Duration::from_secs(2));
        assert!(q.is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(q.is_empty());

        let got = tokio::time::timeout(Duration::from_secs(5), q.get()).await.unwrap();
        assert_eq!(got.as_deref(), Some("ns/a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_after_dropped_on_shutdown() {
        let q = queue();
        q.add_after("ns/a".to_string(), Duration::from_secs(2));
        q.shut_down();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(q.get().await, None);
        assert_eq!(q.metrics().total_adds, 0);
    }

    #[test]
    fn test_add_after_without_runtime_adds_immediately() {
        let q = queue();
        q.add_after("ns/a".to_string(), Duration::from_secs(60));
        assert_eq!(q.len(), 1);
    }
}

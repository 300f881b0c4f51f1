//! Reconciliation controller
//!
//! Wires an [`EventSource`] to a [`WorkQueue`] and drains the queue with a
//! pool of workers. Each worker looks the key up in the [`Mirror`] and hands
//! the result to the [`Reconciler`]. Failures are requeued with backoff
//! until the retry limit, then dropped.

use std::sync::Arc;

use levelset_common::error::{ErrorClassification, ErrorSeverity};
use levelset_common::lifecycle::guard;
use levelset_common::workqueue::{RateLimiterConfig, WorkQueue};
use levelset_domain::{ControllerConfig, ResourceKey};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{ControllerError, ReconcileError};
use super::handler::QueueingHandler;
use super::ports::{EventSource, Mirror, Reconciler};
use super::stats::{ControllerStats, ControllerStatsSnapshot};

const QUEUE_NAME: &str = "reconcile";

/// Level-triggered reconciliation controller
///
/// `C` is the API client handle. The controller never uses it; it is kept
/// so reconcilers and callers can reach the client through one owner.
pub struct Controller<C> {
    client: Arc<C>,
    mirror: Arc<dyn Mirror>,
    reconciler: Arc<dyn Reconciler>,
    queue: WorkQueue<ResourceKey>,
    config: ControllerConfig,
    stats: Arc<ControllerStats>,
}

impl<C: Send + Sync + 'static> Controller<C> {
    /// Build a controller and register its handler with `events`
    ///
    /// # Errors
    /// Returns `ControllerError::Queue` if the rate limiter settings in
    /// `config` are invalid.
    pub fn new(
        client: Arc<C>,
        events: &dyn EventSource,
        mirror: Arc<dyn Mirror>,
        reconciler: Arc<dyn Reconciler>,
        config: ControllerConfig,
    ) -> Result<Self, ControllerError> {
        let limiter = RateLimiterConfig {
            base_delay: config.backoff_base(),
            max_delay: config.backoff_max(),
            qps: config.bucket_qps,
            burst: config.bucket_burst,
        };
        let queue = WorkQueue::with_config(QUEUE_NAME, &limiter)?;
        Ok(Self::with_queue(client, events, mirror, reconciler, queue, config))
    }

    /// Build a controller around an existing queue
    pub fn with_queue(
        client: Arc<C>,
        events: &dyn EventSource,
        mirror: Arc<dyn Mirror>,
        reconciler: Arc<dyn Reconciler>,
        queue: WorkQueue<ResourceKey>,
        config: ControllerConfig,
    ) -> Self {
        let stats = Arc::new(ControllerStats::new());
        events.add_event_handler(Arc::new(QueueingHandler::new(queue.clone(), stats.clone())));

        Self { client, mirror, reconciler, queue, config, stats }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn queue(&self) -> &WorkQueue<ResourceKey> {
        &self.queue
    }

    pub fn stats(&self) -> ControllerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run until `stop` fires
    ///
    /// Waits for the mirror's initial sync, starts the configured number of
    /// workers, and on stop shuts the queue down and waits for the workers
    /// to drain. The queue is shut down on every exit path.
    ///
    /// # Errors
    /// - `ControllerError::CacheSyncFailed` if `stop` fires before the
    ///   mirror has synced; no worker is started.
    /// - `ControllerError::Crashed` if the controller body panics.
    pub async fn run(self: Arc<Self>, stop: CancellationToken) -> Result<(), ControllerError> {
        let queue = self.queue.clone();
        let outcome = guard("controller", Arc::clone(&self).run_until_stopped(stop)).await;
        queue.shut_down();

        match outcome {
            Ok(result) => result,
            Err(crash) => Err(ControllerError::Crashed(crash)),
        }
    }

    async fn run_until_stopped(
        self: Arc<Self>,
        stop: CancellationToken,
    ) -> Result<(), ControllerError> {
        info!(workers = self.config.workers, "Starting controller");

        if !self.wait_for_cache_sync(&stop).await {
            error!("Timed out waiting for caches to sync");
            return Err(ControllerError::CacheSyncFailed);
        }

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.workers {
            let this = Arc::clone(&self);
            workers.spawn(async move { this.run_worker(worker_id).await });
        }
        info!(workers = self.config.workers, "Started workers");

        stop.cancelled().await;
        info!("Stopping controller");
        self.queue.shut_down();

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "Worker task ended abnormally");
            }
        }
        info!(stats = ?self.stats.snapshot(), "Controller stopped");
        Ok(())
    }

    /// Poll the mirror until it has synced; false if `stop` fired first
    async fn wait_for_cache_sync(&self, stop: &CancellationToken) -> bool {
        let poll = self.config.sync_poll_interval();
        loop {
            if self.mirror.has_synced() {
                debug!("Caches synced");
                return true;
            }
            tokio::select! {
                biased;
                () = stop.cancelled() => return false,
                () = tokio::time::sleep(poll) => {}
            }
        }
    }

    async fn run_worker(&self, worker_id: usize) {
        debug!(worker_id, "Worker started");
        while self.process_next_work_item().await {}
        debug!(worker_id, "Worker exiting");
    }

    /// Process one key from the queue
    ///
    /// Returns false once the queue has been shut down and drained. Errors
    /// and panics from the reconcile step or the requeue decision are
    /// handled here and never propagate, so a bad key cannot stop a worker.
    pub async fn process_next_work_item(&self) -> bool {
        let Some(key) = self.queue.get().await else {
            return false;
        };
        let item = self.queue.guard(key);
        let key = item.key();

        let processed = guard("process", async {
            let result = self.reconcile_key(key).await;
            self.handle_result(key, result);
        })
        .await;

        if let Err(crash) = processed {
            self.stats.record_dropped();
            error!(
                %key,
                error = %crash,
                retryable = false,
                "Dropping key after a crash while handling it"
            );
        }
        true
    }

    #[instrument(level = "debug", skip(self, key), fields(key = %key))]
    async fn reconcile_key(&self, key: &ResourceKey) -> Result<(), ReconcileError> {
        let object = self.mirror.get_by_key(key)?;

        match guard("reconcile", self.reconciler.reconcile(key, object)).await {
            Ok(result) => result,
            Err(crash) => Err(ReconcileError::Panicked(crash.to_string())),
        }
    }

    fn handle_result(&self, key: &ResourceKey, result: Result<(), ReconcileError>) {
        let err = match result {
            Ok(()) => {
                self.stats.record_reconciled();
                if self.config.forget_on_success {
                    self.queue.forget(key);
                }
                return;
            }
            Err(err) => err,
        };

        let requeues = self.queue.num_requeues(key);
        if requeues < self.config.retry_limit {
            log_requeue(key, requeues + 1, &err);
            self.queue.add_rate_limited(key.clone());
            self.stats.record_requeued();
            return;
        }

        self.queue.forget(key);
        self.stats.record_dropped();
        error!(
            %key,
            attempts = requeues + 1,
            error = %err,
            retryable = false,
            "Dropping key out of the queue after exhausting retries"
        );
    }
}

/// Log a requeued failure at the level its severity calls for
fn log_requeue(key: &ResourceKey, attempt: u32, err: &ReconcileError) {
    let message = "Error reconciling, requeueing";
    match err.severity() {
        ErrorSeverity::Info => info!(%key, attempt, error = %err, "{message}"),
        ErrorSeverity::Warning => warn!(%key, attempt, error = %err, "{message}"),
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            error!(%key, attempt, error = %err, "{message}");
        }
    }
}

//! Integration tests for the work queue
//!
//! Covers delivery guarantees under concurrent producers and consumers,
//! rate-limited requeue timing, and shutdown draining.

#![cfg(feature = "runtime")]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use levelset_common::testing::{poll_until, MockClock};
use levelset_common::workqueue::{
    BucketRateLimiter, ItemExponentialFailureRateLimiter, MaxOfRateLimiter, RateLimiter,
    RateLimiterConfig, WorkQueue,
};
use parking_lot::Mutex;

fn exponential_queue(name: &str) -> WorkQueue<String> {
    WorkQueue::new(
        name,
        ItemExponentialFailureRateLimiter::new(Duration::from_millis(5), Duration::from_secs(1)),
    )
}

/// Validates that a key is never handed to two workers at once, even when
/// producers keep re-adding it while it is in flight.
///
/// # Test Steps
/// 1. Start four workers that record which keys they currently hold
/// 2. Re-add a small key set from several producers
/// 3. Shut down and join the workers
/// 4. Verify no overlap was ever observed and every key was processed
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_key_never_processed_concurrently() {
    let queue = exponential_queue("concurrency");
    let in_flight = Arc::new(Mutex::new(HashSet::<String>::new()));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let processed = Arc::new(Mutex::new(HashSet::<String>::new()));

    let mut workers = Vec::new();
    for _ in 0..4 {
        let queue = queue.clone();
        let in_flight = in_flight.clone();
        let overlaps = overlaps.clone();
        let processed = processed.clone();
        workers.push(tokio::spawn(async move {
            while let Some(key) = queue.get().await {
                let guard = queue.guard(key);
                if !in_flight.lock().insert(guard.key().clone()) {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
                in_flight.lock().remove(guard.key());
                processed.lock().insert(guard.key().clone());
            }
        }));
    }

    let mut producers = Vec::new();
    for _ in 0..3 {
        let queue = queue.clone();
        producers.push(tokio::spawn(async move {
            for round in 0..50 {
                queue.add(format!("ns/key-{}", round % 5));
                tokio::task::yield_now().await;
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    let drained = poll_until(Duration::from_secs(5), Duration::from_millis(5), || {
        let queue = queue.clone();
        async move { queue.is_empty() && queue.metrics().in_flight() == 0 }
    })
    .await;
    assert!(drained, "queue did not drain");

    queue.shut_down();
    for worker in workers {
        worker.await.unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(processed.lock().len(), 5);
}

/// Validates that consecutive rate-limited requeues produce non-decreasing
/// delays, capped at the ceiling, and that `forget` resets the count.
#[test]
fn test_requeue_delays_non_decreasing_and_capped() {
    let clock = MockClock::new();
    let limiter: MaxOfRateLimiter<String> = MaxOfRateLimiter::new()
        .with(ItemExponentialFailureRateLimiter::new(
            Duration::from_millis(5),
            Duration::from_millis(200),
        ))
        .with(BucketRateLimiter::with_clock(1000.0, 1000, clock).unwrap());
    let key = "ns/a".to_string();

    let delays: Vec<Duration> = (0..12).map(|_| limiter.when(&key)).collect();

    assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(delays.iter().all(|delay| *delay <= Duration::from_millis(200)));
    assert_eq!(delays[11], Duration::from_millis(200));
    assert_eq!(limiter.num_requeues(&key), 12);

    limiter.forget(&key);
    assert_eq!(limiter.num_requeues(&key), 0);
}

/// Validates that `add_rate_limited` delivers the key only after the backoff
/// delay and counts requeues until `forget`.
#[tokio::test(start_paused = true)]
async fn test_add_rate_limited_delivers_after_backoff() {
    let queue = WorkQueue::<String>::with_config(
        "rate-limited",
        &RateLimiterConfig {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            ..Default::default()
        },
    )
    .unwrap();
    let key = "ns/a".to_string();

    queue.add_rate_limited(key.clone());
    queue.add_rate_limited(key.clone());
    assert_eq!(queue.num_requeues(&key), 2);
    assert!(queue.is_empty());

    tokio::time::advance(Duration::from_millis(1500)).await;
    tokio::task::yield_now().await;

    let got = tokio::time::timeout(Duration::from_millis(10), queue.get()).await;
    assert_eq!(got.unwrap().as_deref(), Some("ns/a"));

    queue.forget(&key);
    assert_eq!(queue.num_requeues(&key), 0);
    assert_eq!(queue.metrics().total_retries, 2);
}

/// Validates drain-then-signal shutdown: blocked and future getters see
/// remaining keys first, then `None` immediately.
#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_drains_remaining_keys() {
    let queue = exponential_queue("drain");
    for i in 0..3 {
        queue.add(format!("ns/{i}"));
    }

    queue.shut_down();
    queue.add("ns/late".to_string());

    let mut drained = Vec::new();
    while let Some(key) = queue.get().await {
        queue.done(&key);
        drained.push(key);
    }

    assert_eq!(drained, vec!["ns/0", "ns/1", "ns/2"]);
    let again = tokio::time::timeout(Duration::from_millis(50), queue.get()).await;
    assert_eq!(again.unwrap(), None);
}

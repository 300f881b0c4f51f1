//! Async testing utilities

use std::future::Future;
use std::time::Duration;

/// Poll `condition` every `interval` until it returns true or `timeout`
/// elapses
///
/// Uses tokio's clock, so it cooperates with paused time in
/// `#[tokio::test(start_paused = true)]` tests.
///
/// ```no_run
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use levelset_common::testing::poll_until;
///
/// # async fn example() {
/// let flag = Arc::new(AtomicBool::new(false));
/// let observed = flag.clone();
/// tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });
///
/// assert!(
///     poll_until(Duration::from_secs(1), Duration::from_millis(10), || {
///         let observed = observed.clone();
///         async move { observed.load(Ordering::SeqCst) }
///     })
///     .await
/// );
/// # }
/// ```
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

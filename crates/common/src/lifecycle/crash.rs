//! Crash guard for async task bodies
//!
//! A panic inside a controller loop or a reconcile step should be logged and
//! reported as an error instead of unwinding into the caller. [`guard`]
//! runs a future under `catch_unwind` and converts a panic into
//! [`CommonError::Internal`].
//!
//! Requires `panic = "unwind"`; with `panic = "abort"` the process exits
//! before the guard can observe anything.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use crate::error::{CommonError, CommonResult};

/// Run `future`, converting a panic into an error tagged with `context`
///
/// ```
/// use levelset_common::lifecycle::guard;
///
/// # async fn example() {
/// let ok = guard("worker", async { 7 }).await;
/// assert_eq!(ok.unwrap(), 7);
///
/// let crashed = guard("worker", async { panic!("boom") }).await;
/// assert!(crashed.unwrap_err().to_string().contains("boom"));
/// # }
/// ```
pub async fn guard<F, T>(context: &str, future: F) -> CommonResult<T>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(value) => Ok(value),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(context, panic = %message, "Recovered from panic");
            Err(CommonError::internal_with_context(format!("panicked: {message}"), context))
        }
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

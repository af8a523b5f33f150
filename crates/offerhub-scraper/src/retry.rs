//! Bounded retry for browser-session reads.
//!
//! Card attribute reads go over the WebDriver wire and can fail transiently
//! (stale element references while the page re-renders, a slow command).
//! They are retried a small, fixed number of times with exponential backoff.
//! Connection and navigation failures are propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SessionError;

/// Returns `true` if `err` is worth retrying.
///
/// Retriable: [`SessionError::Command`] and [`SessionError::Timeout`].
/// Not retriable: [`SessionError::Connect`] and [`SessionError::Navigation`];
/// the session itself is gone and another read will fail the same way.
fn is_retriable(err: &SessionError) -> bool {
    matches!(
        err,
        SessionError::Command(_) | SessionError::Timeout { .. }
    )
}

/// Executes `operation`, retrying retriable errors up to `max_retries`
/// additional times.
///
/// The wait before the n-th retry is `backoff_base * 2^(n-1)`. With
/// `max_retries = 2` the operation runs at most 3 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base: Duration,
    mut operation: F,
) -> Result<T, SessionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay = backoff_base.saturating_mul(1u32 << attempt.min(16));
        tracing::debug!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient session error, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

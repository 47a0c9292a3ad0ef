//! Retry with exponential back-off and jitter for remote source calls.
//!
//! Only transient failures (network trouble, 5xx) are retried. Anything
//! that points at a broken request or broken configuration surfaces on
//! the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Timeouts, connect failures and 5xx responses qualify. 4xx API errors,
/// deserialization failures and an invalid base URL do not; repeating the
/// same request cannot change those outcomes.
pub(crate) fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SourceError::Api { status, .. } => *status >= 500,
        SourceError::Deserialize { .. } | SourceError::InvalidBaseUrl(_) => false,
    }
}

/// Sleep before the nth retry (0-based): `base_ms` doubled per retry,
/// capped at 60 s, with 25 % jitter either way.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay_ms(retry: u32, base_ms: u64) -> u64 {
    const CEILING_MS: u64 = 60_000;
    let doubled = base_ms.saturating_mul(1u64 << retry.min(10));
    let jitter = 0.75 + rand::random::<f64>() * 0.5;
    (doubled.min(CEILING_MS) as f64 * jitter) as u64
}

/// Runs `operation`, retrying transient errors up to `max_retries` extra
/// attempts with [`backoff_delay_ms`] sleeps in between. The first
/// non-retriable error, or the last error once the budget is spent, is
/// returned as-is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut retries_done = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retries_done >= max_retries || !is_retriable(&err) {
            return Err(err);
        }

        let delay_ms = backoff_delay_ms(retries_done, backoff_base_ms);
        retries_done += 1;
        tracing::warn!(
            retry = retries_done,
            max_retries,
            delay_ms,
            error = %err,
            "transient source error, backing off before retry"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

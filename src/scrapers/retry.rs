//! Retry with exponential back-off and jitter for upstream requests.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries only
//! when [`ScraperError::is_retriable`] says so. Authentication and
//! configuration failures return immediately.

use std::future::Future;
use std::time::Duration;

use super::error::ScraperError;

const MAX_DELAY_MS: u64 = 30_000;

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The delay before attempt `n + 1` is `backoff_base_ms × 2ⁿ⁻¹` with ±25 %
/// jitter, capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient upstream error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let computed = base_ms.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::types::Source;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ScraperError {
        ScraperError::UpstreamStatus {
            upstream: Source::Devto,
            status: 503,
            message: "busy".into(),
        }
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let first = backoff_delay_ms(1_000, 1);
        assert!((750..=1_250).contains(&first), "got {first}");
        let third = backoff_delay_ms(1_000, 3);
        assert!((3_000..=5_000).contains(&third), "got {third}");
        assert!(backoff_delay_ms(1_000, 30) <= MAX_DELAY_MS * 5 / 4);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(3, 1, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_with_backoff(2, 1, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_auth_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_with_backoff(5, 1, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ScraperError::Authentication {
                upstream: Source::Newsapi,
                status: 401,
            })
        })
        .await;
        assert!(matches!(result, Err(ScraperError::Authentication { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

//! Provider-side rate-limit handling.
//!
//! The provider meters the core API and the search API through separate
//! buckets, each with its own reset instant. When a call reports
//! [`ApiError::RateExceeded`], the adapter looks up the relevant reset
//! instant, suspends until one second past it, and retries. The wait is
//! cancellable so shutdown is not held up by a distant reset.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::error::ApiError;

/// The two rate-limit buckets the provider maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBucket {
    /// Everything except search.
    Core,
    /// The search API, with its own much smaller budget.
    Search,
}

/// Run `op` until it returns something other than
/// [`ApiError::RateExceeded`].
///
/// On exhaustion, `reset_at` is queried for the bucket's reset instant and
/// the task sleeps until one second past it before retrying. Other errors
/// bubble unchanged. Cancelling `cancel` surrenders the sleep promptly and
/// returns [`ApiError::Cancelled`].
pub async fn retry_on_rate_limit<T, Op, Fut, Reset, ResetFut>(
    mut op: Op,
    mut reset_at: Reset,
    cancel: &CancellationToken,
) -> Result<T, ApiError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    Reset: FnMut() -> ResetFut,
    ResetFut: Future<Output = Result<DateTime<Utc>, ApiError>>,
{
    loop {
        match op().await {
            Err(ApiError::RateExceeded) => {
                // A failed reset lookup degrades to an immediate retry
                // after the one-second grace.
                let reset = reset_at().await.unwrap_or_else(|_| Utc::now());
                let wait_secs = (reset - Utc::now()).num_seconds().max(0) as u64 + 1;
                tracing::info!(
                    wait_mins = wait_secs / 60,
                    wait_secs = wait_secs % 60,
                    "not enough API calls left, waiting for the limit to reset"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    _ = tokio::time::sleep(Duration::from_secs(wait_secs)) => {}
                }
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_reset() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_capture = Arc::clone(&attempts);

        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();

        let result = retry_on_rate_limit(
            move || {
                let attempts = Arc::clone(&attempts_capture);
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ApiError::RateExceeded)
                    } else {
                        Ok(42u32)
                    }
                }
            },
            || async { Ok(Utc::now() + chrono::Duration::seconds(2)) },
            &cancel,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(
            start.elapsed() >= Duration::from_secs(2),
            "did not wait for the reset instant"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_bubble_without_retry() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_capture = Arc::clone(&attempts);

        let cancel = CancellationToken::new();
        let result: Result<u32, _> = retry_on_rate_limit(
            move || {
                let attempts = Arc::clone(&attempts_capture);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Unavailable("access blocked".to_string()))
                }
            },
            || async { Ok(Utc::now()) },
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(ApiError::Unavailable(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_surrenders_the_sleep() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<u32, _> = retry_on_rate_limit(
            || async { Err(ApiError::RateExceeded) },
            // A reset so far out that only cancellation can end the wait.
            || async { Ok(Utc::now() + chrono::Duration::hours(6)) },
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(ApiError::Cancelled)));
    }
}

//! Reusable retry/poll combinators for interactive UI steps.
//!
//! Venue UIs gate controls behind transient overlays and load values via
//! AJAX; every such step here is a bounded retry or poll, parameterized by
//! attempts, interval, and a retryable-error predicate.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, ProviderError, Result};

/// Run `op` up to `max_attempts` times, pausing `pause` between attempts.
///
/// An error for which `retryable` returns false aborts immediately. When all
/// attempts are exhausted the last error is returned.
pub async fn with_retries<T, F, Fut, P>(
    max_attempts: u32,
    pause: Duration,
    mut op: F,
    retryable: P,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let mut last_error = None;
    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if retryable(&e) => {
                debug!(attempt, max_attempts, error = %e, "Retryable failure");
                last_error = Some(e);
                if attempt < max_attempts {
                    tokio::time::sleep(pause).await;
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        Error::Provider(ProviderError::TransientUi("no attempts were made".into()))
    }))
}

/// Poll `f` every `interval` until it yields a value or `timeout` elapses.
///
/// Returns `Ok(None)` on timeout; errors from `f` propagate immediately.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut f: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = f().await? {
            return Ok(Some(value));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> Error {
        Error::Provider(ProviderError::TransientUi("overlay".into()))
    }

    fn fatal() -> Error {
        Error::Provider(ProviderError::Authentication {
            provider: "test",
            reason: "bad credentials".into(),
        })
    }

    fn is_transient(e: &Error) -> bool {
        matches!(e, Error::Provider(ProviderError::TransientUi(_)))
    }

    #[tokio::test]
    async fn succeeds_after_retryable_failures() {
        let attempts = AtomicU32::new(0);
        let result = with_retries(
            3,
            Duration::from_millis(1),
            |_| async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok(42)
                }
            },
            is_transient,
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_aborts_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = with_retries(
            3,
            Duration::from_millis(1),
            |_| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(fatal())
            },
            is_transient,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_attempts_return_last_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = with_retries(
            3,
            Duration::from_millis(1),
            |_| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            },
            is_transient,
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::Provider(ProviderError::TransientUi(_)))
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn poll_until_finds_value() {
        let calls = AtomicU32::new(0);
        let found = poll_until(Duration::from_secs(1), Duration::from_millis(1), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Ok(None)
            } else {
                Ok(Some("ready"))
            }
        })
        .await
        .unwrap();
        assert_eq!(found, Some("ready"));
    }

    #[tokio::test]
    async fn poll_until_times_out_to_none() {
        let found: Option<()> =
            poll_until(Duration::from_millis(10), Duration::from_millis(2), || async { Ok(None) })
                .await
                .unwrap();
        assert_eq!(found, None);
    }
}

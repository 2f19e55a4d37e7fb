use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::ScanError;

/// Retry configuration for a single remote operation.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// Fixed backoff plus up to 10% random jitter.
    pub fn delay(&self) -> Duration {
        let jitter = rand::random::<f64>() * self.backoff.as_secs_f64() * 0.1;
        self.backoff + Duration::from_secs_f64(jitter)
    }
}

/// Execute an async operation with retry logic.
///
/// The factory receives the zero-based attempt index so callers can run
/// preparation work before a retry. Non-retryable errors (cancellation,
/// invalid input) fail immediately, and cancelling `cancel` ends the backoff
/// wait with `ScanError::Cancelled`.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut factory: F,
) -> Result<T, ScanError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScanError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..max_attempts {
        debug!(operation = operation_name, attempt = attempt + 1, max = max_attempts, "Attempting operation");
        match factory(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classify();

                if !classification.retryable || attempt + 1 >= max_attempts {
                    if !classification.retryable {
                        debug!(
                            operation = operation_name,
                            error_type = classification.error_type,
                            "Non-retryable error, failing immediately"
                        );
                    } else {
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max = max_attempts,
                            "Max retries exhausted"
                        );
                    }
                    return Err(e);
                }

                let delay = config.delay();
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max = max_attempts,
                    error_type = classification.error_type,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after error"
                );

                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(operation = operation_name, "Cancelled during retry backoff");
                        return Err(ScanError::Cancelled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ScanError::Internal("Retry loop exited unexpectedly".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryConfig {
        RetryConfig { max_attempts: 3, backoff: Duration::from_millis(1) }
    }

    #[test]
    fn test_delay_stays_within_jitter_bound() {
        let config = RetryConfig { max_attempts: 3, backoff: Duration::from_secs(2) };
        for _ in 0..20 {
            let d = config.delay();
            assert!(d >= Duration::from_secs(2));
            assert!(d <= Duration::from_millis(2200));
        }
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_first_try() {
        let result = with_retry("test", &fast(), &CancellationToken::new(), |_| async { Ok::<_, ScanError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_retry_recovers_on_third_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = with_retry("test", &fast(), &CancellationToken::new(), |attempt| {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(ScanError::Transport(TransportError::Status { status: 500, body: String::new() }))
                } else {
                    Ok("started")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "started");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_budget() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = with_retry("test", &fast(), &CancellationToken::new(), |_| {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ScanError::Transport(TransportError::NoResponse("refused".into())))
            }
        })
        .await;

        assert!(matches!(result, Err(ScanError::Transport(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_cancellation_fails_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = with_retry("test", &fast(), &CancellationToken::new(), |_| {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ScanError::Cancelled)
            }
        })
        .await;

        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_ends_wait() {
        let cancel = CancellationToken::new();
        let slow = RetryConfig { max_attempts: 3, backoff: Duration::from_secs(3600) };
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();
        let trigger = cancel.clone();

        let run = with_retry("test", &slow, &cancel, |_| {
            let attempts = attempts_clone.clone();
            let trigger = trigger.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                trigger.cancel();
                Err::<(), _>(ScanError::Transport(TransportError::Status { status: 500, body: String::new() }))
            }
        });
        let result = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("backoff should end on cancellation");

        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}

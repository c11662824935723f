//! Retry with exponential backoff under one overall deadline.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::domain::{OnRampError, ProviderError};

/// First backoff step
pub const BASE_DELAY: Duration = Duration::from_millis(200);

/// Upper bound for a single backoff step
pub const MAX_DELAY: Duration = Duration::from_secs(5);

/// How often, and how patiently, an operation is attempted
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Budget for all attempts together
    pub deadline: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, deadline: Duration) -> Self {
        Self {
            max_retries,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
            deadline,
        }
    }

    /// Backoff before retry number `retry` (0-based): half of the capped
    /// exponential step is fixed, the other half is jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry.min(16)))
            .min(self.max_delay);
        let half = exp / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(jitter_ms)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, runs out
    /// of retries, or the deadline expires.
    ///
    /// Attempts run strictly one after another. Dropping the returned future
    /// aborts the attempt in flight and schedules no further ones.
    pub async fn run<T, F, Fut>(
        &self,
        provider: &str,
        operation: &str,
        mut op: F,
    ) -> Result<T, OnRampError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OnRampError>>,
    {
        let attempts = async {
            let mut retry = 0u32;
            loop {
                match op().await {
                    Ok(value) => return Ok(value),
                    Err(e) if e.is_retryable() && retry < self.max_retries => {
                        let delay = self.backoff(retry);
                        retry += 1;
                        warn!(
                            provider = %provider,
                            operation = %operation,
                            attempt = retry,
                            max_retries = self.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Retrying after transient failure"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        match tokio::time::timeout(self.deadline, attempts).await {
            Ok(result) => result,
            Err(_) => {
                debug!(provider = %provider, operation = %operation, "Deadline exceeded");
                Err(OnRampError::provider(
                    provider,
                    ProviderError::Timeout(format!(
                        "{} exceeded {}s deadline",
                        operation,
                        self.deadline.as_secs_f64()
                    )),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> OnRampError {
        OnRampError::provider(
            "test",
            ProviderError::ApiError {
                status_code: 503,
                message: "unavailable".into(),
            },
        )
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            deadline: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_backoff_is_bounded() {
        let policy = RetryPolicy::new(10, Duration::from_secs(30));
        for retry in 0..12 {
            let delay = policy.backoff(retry);
            let step = BASE_DELAY
                .saturating_mul(2u32.saturating_pow(retry))
                .min(MAX_DELAY);
            assert!(delay >= step / 2, "retry {retry}: {delay:?}");
            assert!(delay <= step, "retry {retry}: {delay:?}");
        }
        assert!(policy.backoff(30) <= MAX_DELAY);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = fast_policy(3)
            .run("test", "op", || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(unavailable())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = fast_policy(1)
            .run("test", "op", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(unavailable())
                }
            })
            .await;

        assert_eq!(result.unwrap_err().code(), ErrorCode::ApiError);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_fail_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = fast_policy(5)
            .run("test", "op", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(OnRampError::provider(
                        "test",
                        ProviderError::ApiError {
                            status_code: 400,
                            message: "bad request".into(),
                        },
                    ))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_covers_all_attempts() {
        let policy = RetryPolicy {
            max_retries: 100,
            base_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(20),
            deadline: Duration::from_millis(100),
        };

        let result: Result<(), _> = policy.run("test", "op", || async { Err(unavailable()) }).await;
        assert_eq!(result.unwrap_err().code(), ErrorCode::Timeout);
    }
}

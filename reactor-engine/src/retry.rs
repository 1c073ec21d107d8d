//! Exponential backoff retry over a provider call.

use rand::Rng;
use reactor_core::config::RetryConfig;
use reactor_turn::provider::ProviderError;
use std::time::Duration;

/// Retries a fallible async operation using `RetryConfig`'s exponential
/// backoff schedule, jittered by +/-50% to avoid synchronized retry storms
/// across tenants sharing a provider.
///
/// Only `ProviderError::is_retryable()` errors are retried. Cancellation is
/// not modeled as a distinct error here: a caller that wants to cancel a
/// retry loop drops the enclosing future, which `tokio::time::sleep` and the
/// retried future both observe as normal future cancellation.
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Build a retry policy from engine configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `f`, retrying on retryable errors until `max_attempts` is reached.
    pub async fn run<F, Fut, T>(&self, mut f: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.config.max_attempts || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = self.next_delay(attempt);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "provider call failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let base = self.config.initial_delay_ms as f64 * self.config.multiplier.powi(attempt as i32 - 1);
        let capped = base.min(self.config.max_delay_ms as f64);
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_millis((capped * jitter).max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry() {
        let policy = RetryPolicy::new(RetryConfig::default());
        let result: Result<u32, ProviderError> = policy.run(|| async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn retries_retryable_errors_until_success() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            multiplier: 1.0,
            max_delay_ms: 5,
        });
        let calls = AtomicU32::new(0);
        let result = policy
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ProviderError::RateLimited)
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable_errors() {
        let policy = RetryPolicy::new(RetryConfig::default());
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::AuthFailed("bad key".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 2,
            initial_delay_ms: 1,
            multiplier: 1.0,
            max_delay_ms: 5,
        });
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::RateLimited)
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Backoff for calls to the chat model and the search API.
//!
//! Only transient failures are retried: transport errors, timeouts, rate limits,
//! server errors and blank model output. A rejected request (bad key, bad
//! model name, malformed body) fails on the first attempt.

use crate::config::RetryConfig;
use crate::error::{ModelError, SearchError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Whether an error is worth another attempt
pub trait Retryable: std::fmt::Display {
    fn is_retryable(&self) -> bool;
}

/// 429 and 5xx are transient, every other status is final
fn transient_status(status: u16) -> bool {
    status == 429 || status >= 500
}

impl Retryable for ModelError {
    fn is_retryable(&self) -> bool {
        match self {
            ModelError::Http(_) | ModelError::EmptyResponse => true,
            ModelError::Status { status, .. } => transient_status(*status),
        }
    }
}

impl Retryable for SearchError {
    fn is_retryable(&self) -> bool {
        match self {
            SearchError::Timeout(_) | SearchError::Http(_) => true,
            SearchError::Status { status, .. } => transient_status(*status),
        }
    }
}

/// Delay before attempt `failed + 1`: `base * 2^(failed - 1)` plus up to `base` of jitter
pub fn backoff_delay<R: Rng + ?Sized>(config: &RetryConfig, failed: u32, rng: &mut R) -> Duration {
    let base = config.backoff_base_ms;
    if base == 0 {
        return Duration::ZERO;
    }
    let exp = base.saturating_mul(1u64 << failed.saturating_sub(1).min(16));
    Duration::from_millis(exp.saturating_add(rng.gen_range(0..base)))
}

/// Run `operation` until it succeeds, fails with a final error, or
/// `max_attempts` is used up. `label` names the service in log lines.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable,
{
    let mut failed = 0;

    loop {
        let e = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        failed += 1;

        if !e.is_retryable() {
            debug!("{} failed with a final error: {}", label, e);
            return Err(e);
        }
        if failed >= config.max_attempts {
            if failed > 1 {
                warn!("{}: all {} attempts failed: {}", label, failed, e);
            }
            return Err(e);
        }

        let delay = backoff_delay(config, failed, &mut rand::thread_rng());
        warn!(
            "{}: attempt {} failed: {}. Retrying in {:?}...",
            label, failed, e, delay
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            backoff_base_ms: 0,
        }
    }

    fn status(status: u16) -> ModelError {
        ModelError::Status {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ModelError::EmptyResponse.is_retryable());
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());

        assert!(SearchError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(SearchError::Status {
            status: 500,
            message: String::new()
        }
        .is_retryable());
        assert!(!SearchError::Status {
            status: 403,
            message: "Unauthorized".into()
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let attempts = AtomicU32::new(0);

        let result: Result<i32, ModelError> =
            retry_with_backoff(&RetryConfig::default(), "chat", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(ModelError::EmptyResponse) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<&str, ModelError> = retry_with_backoff(&config(3), "chat", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Err(status(429)),
                    1 => Err(ModelError::EmptyResponse),
                    _ => Ok("Text"),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "Text");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_final() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), SearchError> = retry_with_backoff(&config(5), "search", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SearchError::Status {
                    status: 401,
                    message: "bad key".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(SearchError::Status { status: 401, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempts_are_capped() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), ModelError> = retry_with_backoff(&config(2), "chat", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(status(502)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_delay_doubles_within_jitter() {
        let config = RetryConfig {
            max_attempts: 4,
            backoff_base_ms: 100,
        };
        let mut rng = StdRng::seed_from_u64(1);

        for (failed, floor) in [(1, 100), (2, 200), (3, 400)] {
            let delay = backoff_delay(&config, failed, &mut rng).as_millis() as u64;
            assert!((floor..floor + 100).contains(&delay), "{} -> {}", failed, delay);
        }
        assert_eq!(backoff_delay(&self::config(3), 2, &mut rng), Duration::ZERO);
    }
}

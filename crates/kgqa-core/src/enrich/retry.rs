//! Retry with exponential backoff for collaborator calls

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::config::EnrichmentConfig;
use crate::error::{Error, Result};

/// How many times to try a call and how long to wait between tries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first; at least 1
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl From<&EnrichmentConfig> for RetryPolicy {
    fn from(config: &EnrichmentConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base_ms: config.backoff_base_ms,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_base_ms: 0,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Only errors for which [`Error::is_transient`] holds are retried.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && e.is_transient() => {
                    let wait_ms = self.backoff_ms(attempt, &e);
                    warn!(
                        attempt,
                        max_attempts,
                        wait_ms,
                        error = %e,
                        "Collaborator call failed, retrying after backoff"
                    );
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exponential delay for the given 1-based attempt, honouring rate-limit hints
    fn backoff_ms(&self, attempt: u32, error: &Error) -> u64 {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self.backoff_base_ms.saturating_mul(1u64 << exponent);
        let suggested = match error {
            Error::RateLimited(secs) => secs.saturating_mul(1000),
            _ => 0,
        };
        let delay = base.max(suggested);

        // up to 10% jitter
        let jitter = delay / 10;
        delay + rand::thread_rng().gen_range(0..=jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_base_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast(3)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast(3)
            .run(move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(Error::LLMTimeout(600))
                } else {
                    Ok("done")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = fast(2)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::LLMServerError {
                    status: 500,
                    message: "boom".into(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = fast(5)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::LLMError("Bad request: nope".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_growth() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_base_ms: 1000,
        };
        let err = Error::LLMTimeout(1);
        assert!((1000..=1100).contains(&policy.backoff_ms(1, &err)));
        assert!((2000..=2200).contains(&policy.backoff_ms(2, &err)));
        assert!(policy.backoff_ms(1, &Error::RateLimited(5)) >= 5000);
    }

    #[test]
    fn test_from_config() {
        let config = EnrichmentConfig {
            max_attempts: 0,
            backoff_base_ms: 10,
            dedup: false,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff_base_ms, 10);
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }
}

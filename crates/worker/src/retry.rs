//! Bounded retry with exponential backoff.
//!
//! Price resolver and store calls carry a per-call deadline; exceeding it
//! counts as a transient failure, the same as an explicit `Unavailable`.
//! Non-transient errors abort immediately.

use log::warn;
use plutus_ports::{PriceError, StoreError};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that may be worth another attempt
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

impl Transient for PriceError {
    fn is_transient(&self) -> bool {
        PriceError::is_transient(self)
    }
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Deadline applied to each individual attempt
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1 << attempt.min(16));
        exp.min(self.max_delay)
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Non-transient error; retrying would not help
    Fatal(E),
    /// Every attempt failed transiently (or timed out)
    Exhausted { attempts: u32, last: Option<E> },
}

/// Run `op` until it succeeds, fails fatally, or the policy is exhausted.
///
/// Each attempt runs under `call_timeout`; a timeout is treated as a
/// transient failure with no inner error.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut last: Option<E> = None;
    for attempt in 0..policy.max_attempts {
        match tokio::time::timeout(policy.call_timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if !e.is_transient() => return Err(RetryError::Fatal(e)),
            Ok(Err(e)) => {
                warn!("{} attempt {} failed: {}", what, attempt + 1, e);
                last = Some(e);
            }
            Err(_) => {
                warn!("{} attempt {} timed out", what, attempt + 1);
            }
        }
        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }
    Err(RetryError::Exhausted {
        attempts: policy.max_attempts,
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            call_timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StoreError::Unavailable("flaky".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PriceError::UnknownSymbol("NOPE".into())) }
        })
        .await;

        assert!(matches!(
            result,
            Err(RetryError::Fatal(PriceError::UnknownSymbol(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_last_error() {
        let result: Result<(), _> = with_retry(&fast_policy(), "op", || async {
            Err(StoreError::Unavailable("down".into()))
        })
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, Some(StoreError::Unavailable(_))));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_transient() {
        let result: Result<(), RetryError<StoreError>> =
            with_retry(&fast_policy(), "op", || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(RetryError::Exhausted { attempts: 3, last: None })
        ));
    }
}

//! Bounded retries with exponential backoff and jitter.
//!
//! Wraps a single adapter call. Only `Retryable` errors (transient faults,
//! vendor 5xx) are retried in place; rate limits and credential failures
//! return immediately so the router can fail over without burning the
//! retry budget. Every attempt, success or failure, is reported to the
//! health tracker before any sleep.

use std::future::Future;
use std::time::Duration;

use log::debug;
use rand::Rng;

use crate::errors::{MarketDataError, RetryClass};
use crate::health::HealthTracker;
use crate::models::Bar;

/// Retry budget and backoff schedule for one adapter call.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts per adapter, including the first (default 3).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the `attempt`-th failure (1-based):
    /// `min(base * 2^(attempt-1), max)` with ±25% uniform jitter so
    /// concurrent workers do not retry in lockstep.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let raw = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        let jitter = rand::thread_rng().gen_range(0.75..=1.25);
        raw.mul_f64(jitter)
    }
}

/// Run `op` against one adapter under the retry policy, reporting each
/// attempt to the health tracker.
///
/// A `NoData` error is converted into a successful empty result here: it is
/// a valid vendor answer and must not count against the adapter's health.
pub async fn execute_with_retry<F, Fut>(
    policy: &RetryPolicy,
    health: &HealthTracker,
    provider: &str,
    mut op: F,
) -> Result<Vec<Bar>, MarketDataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<Bar>, MarketDataError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(bars) => {
                health.record_success(provider);
                return Ok(bars);
            }
            Err(MarketDataError::NoData) => {
                health.record_success(provider);
                return Ok(Vec::new());
            }
            Err(err) => {
                if let Some(kind) = err.failure_kind() {
                    health.record_failure(provider, kind);
                }
                attempt += 1;
                if err.retry_class() != RetryClass::Retryable || attempt >= policy.max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                debug!(
                    "Retrying {} after failure {}/{} in {:?}: {}",
                    provider, attempt, policy.max_attempts, delay, err
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::health::HealthPolicy;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn tracker() -> HealthTracker {
        HealthTracker::new(HealthPolicy::default(), ["MOCK"])
    }

    #[test]
    fn test_delay_schedule_is_bounded() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        for attempt in 1..=10 {
            let delay = policy.delay_for(attempt);
            // 500ms cap plus 25% jitter headroom.
            assert!(delay <= Duration::from_millis(625), "attempt {}", attempt);
        }
        // First retry stays near the base delay.
        let first = policy.delay_for(1);
        assert!(first >= Duration::from_millis(75));
        assert!(first <= Duration::from_millis(125));
    }

    #[tokio::test]
    async fn test_transient_retries_up_to_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let health = tracker();
        let calls_in = calls.clone();

        let result = execute_with_retry(&fast_policy(), &health, "MOCK", move || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MarketDataError::Transient {
                    provider: "MOCK".to_string(),
                    message: "boom".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // All three failures were recorded, tripping the default threshold.
        assert!(!health.is_available("MOCK"));
    }

    #[tokio::test]
    async fn test_rate_limited_is_not_retried_in_place() {
        let calls = Arc::new(AtomicUsize::new(0));
        let health = tracker();
        let calls_in = calls.clone();

        let result = execute_with_retry(&fast_policy(), &health, "MOCK", move || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MarketDataError::RateLimited {
                    provider: "MOCK".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(MarketDataError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!health.is_available("MOCK"));
    }

    #[tokio::test]
    async fn test_success_after_transient_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let health = tracker();
        let calls_in = calls.clone();

        let result = execute_with_retry(&fast_policy(), &health, "MOCK", move || {
            let calls = calls_in.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(MarketDataError::Transient {
                        provider: "MOCK".to_string(),
                        message: "blip".to_string(),
                    })
                } else {
                    Ok(Vec::new())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(health.is_available("MOCK"));
    }

    #[tokio::test]
    async fn test_no_data_is_an_empty_success() {
        let health = tracker();
        let result = execute_with_retry(&fast_policy(), &health, "MOCK", || async {
            Err(MarketDataError::NoData)
        })
        .await;

        assert_eq!(result.unwrap().len(), 0);
        assert!(health.is_available("MOCK"));
        let report = health.snapshot().into_iter().next().unwrap();
        assert_eq!(report.total_successes, 1);
    }
}

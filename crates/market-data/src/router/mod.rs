//! Failover routing across an ordered adapter list.
//!
//! The list order is caller-supplied and static; the router never reorders
//! based on observed latency, keeping behavior deterministic. Unavailable
//! adapters are skipped, available ones run through the retry executor, and
//! when the whole list is exhausted the error carries each adapter's last
//! failure for diagnostics.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::errors::{MarketDataError, ProviderAttempt};
use crate::health::{HealthPolicy, HealthTracker, ProviderHealthReport};
use crate::models::{Bar, Granularity};
use crate::provider::BarProvider;
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::validator::validate_bars;

/// A successful routed fetch: the validated bars plus which adapter served
/// them.
#[derive(Debug)]
pub struct RoutedBars {
    pub bars: Vec<Bar>,
    /// Id of the adapter that produced the bars.
    pub provider: &'static str,
}

/// Routes bar fetches across adapters in preference order.
pub struct FailoverRouter {
    providers: Vec<Arc<dyn BarProvider>>,
    health: Arc<HealthTracker>,
    retry: RetryPolicy,
}

impl FailoverRouter {
    /// Build a router over `providers` in preference order (primary first).
    pub fn new(
        providers: Vec<Arc<dyn BarProvider>>,
        health_policy: HealthPolicy,
        retry: RetryPolicy,
    ) -> Self {
        let health = Arc::new(HealthTracker::new(
            health_policy,
            providers.iter().map(|p| p.id()),
        ));
        Self {
            providers,
            health,
            retry,
        }
    }

    /// The shared health tracker (diagnostic snapshots).
    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    /// Fetch bars for one symbol/range, failing over through the adapter
    /// list. Bars are hard-validated before being returned.
    pub async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<RoutedBars, MarketDataError> {
        let mut attempts: Vec<ProviderAttempt> = Vec::new();

        for provider in &self.providers {
            let id = provider.id();
            if !self.health.is_available(id) {
                debug!("Skipping unavailable provider {} for {}", id, symbol);
                attempts.push(ProviderAttempt {
                    provider: id.to_string(),
                    error: "skipped: unavailable".to_string(),
                });
                continue;
            }

            let outcome = execute_with_retry(&self.retry, &self.health, id, || {
                provider.fetch_bars(symbol, start, end, granularity)
            })
            .await;

            match outcome {
                Ok(bars) => {
                    debug!("Provider {} returned {} bars for {}", id, bars.len(), symbol);
                    return Ok(RoutedBars {
                        bars: validate_bars(id, bars),
                        provider: id,
                    });
                }
                Err(err) => {
                    warn!("Provider {} failed for {}: {}", id, symbol, err);
                    attempts.push(ProviderAttempt {
                        provider: id.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Err(MarketDataError::AllProvidersExhausted { attempts })
    }

    /// Health reports for every configured adapter.
    pub fn health_snapshot(&self) -> Vec<ProviderHealthReport> {
        self.health.snapshot()
    }
}

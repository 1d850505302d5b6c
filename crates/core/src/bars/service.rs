//! Acquisition facade.
//!
//! The only entry point external collaborators use. Composes the failover
//! router and the bar store, and enforces the engine's consistency
//! contract: for every successful acquisition, the bars returned to the
//! caller are exactly the bars newly upserted into the cache. Vendor
//! context fetched for correctness (e.g. the lookback window behind
//! `acquire_latest`) is sliced away *before* anything is persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, info};

use barvault_market_data::{
    Bar, FailoverRouter, Granularity, ProviderHealthReport, RoutedBars,
};

use crate::config::EngineConfig;
use crate::errors::{Error, Result};

use super::store::{BarFilter, BarStore};

/// Result of a successful range acquisition.
#[derive(Debug)]
pub struct Acquisition {
    /// The bars returned to the caller; exactly these were upserted.
    pub bars: Vec<Bar>,
    /// Id of the adapter that served the request.
    pub provider: String,
}

/// Result of a successful latest-bar acquisition.
///
/// `bar` is `None` when the vendor legitimately has nothing yet for the
/// period (e.g. pre-market); that is not an error, and nothing is written.
#[derive(Debug)]
pub struct LatestAcquisition {
    pub bar: Option<Bar>,
    pub provider: String,
}

/// The acquisition facade: vendor failover in front, cache behind.
pub struct AcquisitionService<S: BarStore> {
    store: Arc<S>,
    router: Arc<FailoverRouter>,
    config: EngineConfig,
    /// Serializes concurrent acquisitions for the same (symbol,
    /// granularity) so two writers never race on identical cache keys with
    /// different observed vendor windows.
    key_locks: Mutex<HashMap<(String, Granularity), Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: BarStore> AcquisitionService<S> {
    pub fn new(store: Arc<S>, router: Arc<FailoverRouter>, config: EngineConfig) -> Self {
        Self {
            store,
            router,
            config,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Uppercase/trim a caller-supplied symbol, rejecting empty input.
    fn normalize_symbol(symbol: &str) -> Result<String> {
        let normalized = symbol.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(Error::InvalidInput("symbol must not be empty".to_string()));
        }
        Ok(normalized)
    }

    fn key_lock(&self, symbol: &str, granularity: Granularity) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // An entry only the map still references has no holder; evict it
        // so churning symbols cannot grow the map without bound.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry((symbol.to_string(), granularity))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub(super) fn key_lock_count(&self) -> usize {
        self.key_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Acquire bars for exactly `[start, end]` and persist exactly what is
    /// returned.
    pub async fn acquire_range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Acquisition> {
        let symbol = Self::normalize_symbol(symbol)?;
        if end < start {
            return Err(Error::InvalidInput(format!(
                "end must not precede start ({} < {})",
                end, start
            )));
        }

        let lock = self.key_lock(&symbol, granularity);
        let _guard = lock.lock().await;

        debug!("Routing range request for {} ({})", symbol, granularity);
        let RoutedBars { bars, provider } = self
            .router
            .fetch_bars(&symbol, start, end, granularity)
            .await?;

        debug!("Slicing {} fetched bars for {}", bars.len(), symbol);
        let bars: Vec<Bar> = bars
            .into_iter()
            .filter(|bar| bar.timestamp >= start && bar.timestamp <= end)
            .collect();

        debug!("Persisting {} bars for {}", bars.len(), symbol);
        if !bars.is_empty() {
            self.store.upsert_bars(&bars).await?;
        }

        info!(
            "Acquired {} {} bars for {} via {}",
            bars.len(),
            granularity,
            symbol,
            provider
        );
        Ok(Acquisition {
            bars,
            provider: provider.to_string(),
        })
    }

    /// Acquire the single freshest bar for a symbol.
    ///
    /// A lookback window is fetched from the vendor for context, but only
    /// the newest bar survives the slicing phase; it alone is persisted and
    /// returned. The context never leaks into the cache.
    pub async fn acquire_latest(
        &self,
        symbol: &str,
        granularity: Granularity,
    ) -> Result<LatestAcquisition> {
        let symbol = Self::normalize_symbol(symbol)?;

        let lock = self.key_lock(&symbol, granularity);
        let _guard = lock.lock().await;

        let end = Utc::now();
        let start = end - self.config.latest_lookback(granularity);

        debug!("Routing latest request for {} ({})", symbol, granularity);
        let RoutedBars { bars, provider } = self
            .router
            .fetch_bars(&symbol, start, end, granularity)
            .await?;

        debug!(
            "Slicing {} context bars for {} down to the newest",
            bars.len(),
            symbol
        );
        let latest = bars.into_iter().max_by_key(|bar| bar.timestamp);

        if let Some(bar) = &latest {
            debug!("Persisting latest {} bar for {}", granularity, symbol);
            self.store.upsert_bars(std::slice::from_ref(bar)).await?;
            info!(
                "Acquired latest {} bar for {} at {} via {}",
                granularity, symbol, bar.timestamp, provider
            );
        } else {
            info!(
                "No {} bar available yet for {} via {}",
                granularity, symbol, provider
            );
        }

        Ok(LatestAcquisition {
            bar: latest,
            provider: provider.to_string(),
        })
    }

    /// Read cached bars. Never triggers a vendor call.
    pub async fn cached_range(&self, filter: &BarFilter) -> Result<Vec<Bar>> {
        self.store.bars_in_range(filter).await
    }

    /// Destructive invalidation of one granularity (optionally one symbol).
    /// Used before full refreshes so stale rows cannot linger alongside
    /// freshly written ones.
    pub async fn clear_cache(
        &self,
        granularity: Granularity,
        symbol: Option<&str>,
    ) -> Result<usize> {
        let normalized = symbol.map(Self::normalize_symbol).transpose()?;
        let removed = self
            .store
            .clear_bars(granularity, normalized.as_deref())
            .await?;
        info!(
            "Cleared {} cached {} rows{}",
            removed,
            granularity,
            normalized
                .map(|s| format!(" for {}", s))
                .unwrap_or_default()
        );
        Ok(removed)
    }

    /// Diagnostic surface: per-adapter availability and counters.
    pub fn provider_health(&self) -> Vec<ProviderHealthReport> {
        self.router.health_snapshot()
    }
}

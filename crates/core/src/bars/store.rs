//! Bar storage trait.
//!
//! Abstracts the persistence layer so different backends can sit behind the
//! acquisition facade. The contract mirrors the cache semantics the engine
//! guarantees: keyed upserts, ascending range queries, partition-targeted
//! invalidation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use barvault_market_data::{Bar, Granularity};

use crate::errors::Result;

/// Query filter for cached bars.
#[derive(Clone, Debug)]
pub struct BarFilter {
    /// Restrict to these symbols; `None` means all symbols.
    pub symbols: Option<Vec<String>>,
    /// Which granularity to read (selects the partition).
    pub granularity: Granularity,
    /// Inclusive lower time bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper time bound.
    pub end: Option<DateTime<Utc>>,
}

impl BarFilter {
    /// Filter matching every bar of a granularity.
    pub fn all(granularity: Granularity) -> Self {
        Self {
            symbols: None,
            granularity,
            start: None,
            end: None,
        }
    }

    /// Filter for a single symbol.
    pub fn symbol(symbol: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            symbols: Some(vec![symbol.into()]),
            granularity,
            start: None,
            end: None,
        }
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }
}

/// Storage interface for OHLCV bars.
///
/// # Contract
///
/// - `(symbol, timestamp, granularity)` is the primary key: upserting a bar
///   whose key exists replaces the row atomically, never duplicates it.
/// - Daily and intraday bars live in separate partitions; a write path for
///   one class never touches rows of the other.
/// - Range queries return bars ascending by timestamp.
/// - One `upsert_bars` call is a single transactional unit: either every
///   bar in the slice is written or none is.
#[async_trait]
pub trait BarStore: Send + Sync {
    /// Insert-or-replace the given bars. Returns the number of rows
    /// written.
    async fn upsert_bars(&self, bars: &[Bar]) -> Result<usize>;

    /// Bars matching the filter, ascending by timestamp.
    async fn bars_in_range(&self, filter: &BarFilter) -> Result<Vec<Bar>>;

    /// Remove all rows of `granularity`, optionally narrowed to one symbol.
    /// Returns the number of rows removed. Never touches the other
    /// partition.
    async fn clear_bars(&self, granularity: Granularity, symbol: Option<&str>) -> Result<usize>;
}

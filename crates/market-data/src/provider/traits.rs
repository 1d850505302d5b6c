use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::{Bar, Granularity};

/// Common fetch contract every vendor adapter implements.
///
/// An adapter normalizes one vendor's transport, auth and response shape
/// into this contract. Implementations must:
///
/// - return bars ascending by timestamp;
/// - classify every failure into exactly one [`MarketDataError`] variant;
/// - treat a valid-but-empty vendor response as `Ok(vec![])`, never as an
///   error (the vendor legitimately has nothing for the range).
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// Stable adapter identifier (e.g. "ALPACA"), used as the health
    /// tracker key and in diagnostics.
    fn id(&self) -> &'static str;

    /// Fetch bars for `symbol` in `[start, end]` at `granularity`.
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Vec<Bar>, MarketDataError>;
}

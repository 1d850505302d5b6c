use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Granularity;

/// One OHLCV observation for a symbol at a given timestamp and granularity.
///
/// A bar is uniquely identified by `(symbol, timestamp, granularity)`; that
/// tuple is the cache primary key, and a second write to the same key
/// overwrites the stored row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Uppercase ticker symbol (e.g. "AAPL").
    pub symbol: String,
    /// Bar timestamp, always UTC. For daily bars this is the session date
    /// at midnight UTC; for intraday bars the bucket open instant.
    pub timestamp: DateTime<Utc>,
    /// Time-bucket size of this bar.
    pub granularity: Granularity,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Traded volume over the bar; never negative.
    pub volume: i64,
}

impl Bar {
    /// Construct a bar from OHLCV components.
    #[allow(clippy::too_many_arguments)]
    pub fn ohlcv(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        granularity: Granularity,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            granularity,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// The cache primary key of this bar.
    pub fn key(&self) -> (&str, DateTime<Utc>, Granularity) {
        (&self.symbol, self.timestamp, self.granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_bar() -> Bar {
        Bar::ohlcv(
            "AAPL",
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
            Granularity::Daily,
            dec!(190.10),
            dec!(193.55),
            dec!(189.80),
            dec!(192.25),
            44_532_100,
        )
    }

    #[test]
    fn test_ohlcv_constructor() {
        let bar = sample_bar();
        assert_eq!(bar.symbol, "AAPL");
        assert_eq!(bar.granularity, Granularity::Daily);
        assert_eq!(bar.close, dec!(192.25));
        assert_eq!(bar.volume, 44_532_100);
    }

    #[test]
    fn test_key_distinguishes_granularity() {
        let daily = sample_bar();
        let mut intraday = sample_bar();
        intraday.granularity = Granularity::Min15;
        assert_ne!(daily.key(), intraday.key());
    }
}

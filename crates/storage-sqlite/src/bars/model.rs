//! Database models for cached bars.
//!
//! Prices are stored as TEXT to round-trip `Decimal` values exactly.
//! Timestamps are TEXT in fixed-width UTC formats so lexicographic order
//! matches chronological order, which lets range filters compare strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use barvault_market_data::{Bar, Granularity};

use crate::errors::StorageError;

/// Day key format for the daily partition.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Timestamp format for the intraday partition (UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database model for a daily bar.
#[derive(Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::daily_bars)]
#[diesel(primary_key(symbol, bar_date))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailyBarRow {
    pub symbol: String,
    pub bar_date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: i64,
    pub created_at: String,
}

/// Database model for an intraday bar.
#[derive(Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::intraday_bars)]
#[diesel(primary_key(symbol, bar_timestamp, timeframe))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IntradayBarRow {
    pub symbol: String,
    pub bar_timestamp: String,
    pub timeframe: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: i64,
    pub created_at: String,
}

impl DailyBarRow {
    pub fn from_bar(bar: &Bar, created_at: &str) -> Self {
        Self {
            symbol: bar.symbol.clone(),
            bar_date: bar.timestamp.format(DATE_FORMAT).to_string(),
            open: bar.open.to_string(),
            high: bar.high.to_string(),
            low: bar.low.to_string(),
            close: bar.close.to_string(),
            volume: bar.volume,
            created_at: created_at.to_string(),
        }
    }
}

impl IntradayBarRow {
    pub fn from_bar(bar: &Bar, created_at: &str) -> Self {
        Self {
            symbol: bar.symbol.clone(),
            bar_timestamp: bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            timeframe: bar.granularity.as_str().to_string(),
            open: bar.open.to_string(),
            high: bar.high.to_string(),
            low: bar.low.to_string(),
            close: bar.close.to_string(),
            volume: bar.volume,
            created_at: created_at.to_string(),
        }
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| StorageError::CorruptRow(format!("bad {field} value {value:?}: {e}")))
}

impl TryFrom<DailyBarRow> for Bar {
    type Error = StorageError;

    fn try_from(row: DailyBarRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&row.bar_date, DATE_FORMAT).map_err(|e| {
            StorageError::CorruptRow(format!("bad bar_date {:?}: {e}", row.bar_date))
        })?;
        let timestamp: DateTime<Utc> = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| StorageError::CorruptRow(format!("bad bar_date {:?}", row.bar_date)))?
            .and_utc();

        Ok(Bar {
            symbol: row.symbol,
            timestamp,
            granularity: Granularity::Daily,
            open: parse_decimal("open", &row.open)?,
            high: parse_decimal("high", &row.high)?,
            low: parse_decimal("low", &row.low)?,
            close: parse_decimal("close", &row.close)?,
            volume: row.volume,
        })
    }
}

impl TryFrom<IntradayBarRow> for Bar {
    type Error = StorageError;

    fn try_from(row: IntradayBarRow) -> Result<Self, Self::Error> {
        let naive = NaiveDateTime::parse_from_str(&row.bar_timestamp, TIMESTAMP_FORMAT).map_err(
            |e| StorageError::CorruptRow(format!("bad bar_timestamp {:?}: {e}", row.bar_timestamp)),
        )?;
        let granularity = Granularity::from_str(&row.timeframe).map_err(|e| {
            StorageError::CorruptRow(format!("bad timeframe {:?}: {e}", row.timeframe))
        })?;

        Ok(Bar {
            symbol: row.symbol,
            timestamp: naive.and_utc(),
            granularity,
            open: parse_decimal("open", &row.open)?,
            high: parse_decimal("high", &row.high)?,
            low: parse_decimal("low", &row.low)?,
            close: parse_decimal("close", &row.close)?,
            volume: row.volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample(granularity: Granularity) -> Bar {
        Bar {
            symbol: "AAPL".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 15, 30, 0).unwrap(),
            granularity,
            open: dec!(189.50),
            high: dec!(191.0025),
            low: dec!(188.75),
            close: dec!(190.10),
            volume: 1_234_567,
        }
    }

    #[test]
    fn daily_row_round_trips_to_date_midnight() {
        let bar = sample(Granularity::Daily);
        let row = DailyBarRow::from_bar(&bar, "2025-03-14 16:00:00");
        assert_eq!(row.bar_date, "2025-03-14");

        let back = Bar::try_from(row).unwrap();
        assert_eq!(
            back.timestamp,
            Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap()
        );
        assert_eq!(back.close, dec!(190.10));
        assert_eq!(back.granularity, Granularity::Daily);
    }

    #[test]
    fn intraday_row_preserves_time_and_timeframe() {
        let bar = sample(Granularity::Min15);
        let row = IntradayBarRow::from_bar(&bar, "2025-03-14 16:00:00");
        assert_eq!(row.bar_timestamp, "2025-03-14 15:30:00");
        assert_eq!(row.timeframe, "15min");

        let back = Bar::try_from(row).unwrap();
        assert_eq!(back.timestamp, bar.timestamp);
        assert_eq!(back.granularity, Granularity::Min15);
        assert_eq!(back.open, dec!(189.50));
    }

    #[test]
    fn corrupt_price_text_is_rejected() {
        let bar = sample(Granularity::Daily);
        let mut row = DailyBarRow::from_bar(&bar, "2025-03-14 16:00:00");
        row.close = "not-a-number".to_string();
        assert!(matches!(
            Bar::try_from(row),
            Err(StorageError::CorruptRow(_))
        ));
    }
}

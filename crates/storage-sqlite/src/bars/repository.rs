//! SQLite-backed implementation of the bar cache.
//!
//! Reads go straight to the pool; every write funnels through the single
//! writer actor so one `upsert_bars` call commits as one immediate
//! transaction even when it spans both partitions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::debug;

use barvault_core::{BarFilter, BarStore, Result};
use barvault_market_data::{Bar, Granularity};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::daily_bars::dsl as daily_dsl;
use crate::schema::intraday_bars::dsl as intraday_dsl;

use super::model::{DailyBarRow, IntradayBarRow, DATE_FORMAT, TIMESTAMP_FORMAT};

/// Upserts are chunked to stay under SQLite's bind-parameter limit.
const UPSERT_CHUNK_SIZE: usize = 1_000;

/// Bar cache backed by SQLite, split into daily and intraday partitions.
pub struct SqliteBarStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteBarStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl BarStore for SqliteBarStore {
    async fn upsert_bars(&self, bars: &[Bar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let created_at = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let mut daily_rows = Vec::new();
        let mut intraday_rows = Vec::new();
        for bar in bars {
            if bar.granularity.is_intraday() {
                intraday_rows.push(IntradayBarRow::from_bar(bar, &created_at));
            } else {
                daily_rows.push(DailyBarRow::from_bar(bar, &created_at));
            }
        }

        self.writer
            .exec(move |conn| {
                let mut written = 0;
                for chunk in daily_rows.chunks(UPSERT_CHUNK_SIZE) {
                    written += diesel::replace_into(daily_dsl::daily_bars)
                        .values(chunk)
                        .execute(conn)
                        .into_core()?;
                }
                for chunk in intraday_rows.chunks(UPSERT_CHUNK_SIZE) {
                    written += diesel::replace_into(intraday_dsl::intraday_bars)
                        .values(chunk)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(written)
            })
            .await
    }

    async fn bars_in_range(&self, filter: &BarFilter) -> Result<Vec<Bar>> {
        let mut conn = get_connection(&self.pool)?;

        let mut bars: Vec<Bar> = if filter.granularity.is_intraday() {
            let mut query = intraday_dsl::intraday_bars
                .filter(intraday_dsl::timeframe.eq(filter.granularity.as_str()))
                .order((intraday_dsl::bar_timestamp.asc(), intraday_dsl::symbol.asc()))
                .into_boxed();

            if let Some(symbols) = &filter.symbols {
                query = query.filter(intraday_dsl::symbol.eq_any(symbols.clone()));
            }
            if let Some(start) = filter.start {
                query = query.filter(
                    intraday_dsl::bar_timestamp.ge(start.format(TIMESTAMP_FORMAT).to_string()),
                );
            }
            if let Some(end) = filter.end {
                query = query.filter(
                    intraday_dsl::bar_timestamp.le(end.format(TIMESTAMP_FORMAT).to_string()),
                );
            }

            let rows = query.load::<IntradayBarRow>(&mut conn).into_core()?;
            rows.into_iter()
                .map(|row| Bar::try_from(row).map_err(Into::into))
                .collect::<Result<_>>()?
        } else {
            let mut query = daily_dsl::daily_bars
                .order((daily_dsl::bar_date.asc(), daily_dsl::symbol.asc()))
                .into_boxed();

            if let Some(symbols) = &filter.symbols {
                query = query.filter(daily_dsl::symbol.eq_any(symbols.clone()));
            }
            if let Some(start) = filter.start {
                query = query.filter(daily_dsl::bar_date.ge(start.format(DATE_FORMAT).to_string()));
            }
            if let Some(end) = filter.end {
                query = query.filter(daily_dsl::bar_date.le(end.format(DATE_FORMAT).to_string()));
            }

            let rows = query.load::<DailyBarRow>(&mut conn).into_core()?;
            rows.into_iter()
                .map(|row| Bar::try_from(row).map_err(Into::into))
                .collect::<Result<_>>()?
        };

        // SQL bounds compare at partition precision (whole days for the
        // daily table); re-apply the exact instant bounds here.
        if let Some(start) = filter.start {
            bars.retain(|bar| bar.timestamp >= start);
        }
        if let Some(end) = filter.end {
            bars.retain(|bar| bar.timestamp <= end);
        }

        Ok(bars)
    }

    async fn clear_bars(&self, granularity: Granularity, symbol: Option<&str>) -> Result<usize> {
        let symbol = symbol.map(str::to_string);

        // Delete statements cannot be boxed, so the optional symbol filter
        // is a branch rather than a dynamic clause.
        let removed = self
            .writer
            .exec(move |conn| {
                let count = match (granularity.is_intraday(), &symbol) {
                    (true, Some(sym)) => diesel::delete(
                        intraday_dsl::intraday_bars
                            .filter(intraday_dsl::timeframe.eq(granularity.as_str()))
                            .filter(intraday_dsl::symbol.eq(sym.clone())),
                    )
                    .execute(conn),
                    (true, None) => diesel::delete(
                        intraday_dsl::intraday_bars
                            .filter(intraday_dsl::timeframe.eq(granularity.as_str())),
                    )
                    .execute(conn),
                    (false, Some(sym)) => diesel::delete(
                        daily_dsl::daily_bars.filter(daily_dsl::symbol.eq(sym.clone())),
                    )
                    .execute(conn),
                    (false, None) => diesel::delete(daily_dsl::daily_bars).execute(conn),
                };
                count.into_core()
            })
            .await?;

        debug!("cleared {} {} bar(s)", removed, granularity);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    use crate::db;

    fn bar(symbol: &str, timestamp: DateTime<Utc>, granularity: Granularity, close: &str) -> Bar {
        Bar {
            symbol: symbol.to_string(),
            timestamp,
            granularity,
            open: dec!(100),
            high: dec!(110),
            low: dec!(95),
            close: close.parse().unwrap(),
            volume: 1_000,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, 0, 0, 0).unwrap()
    }

    fn minute(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, min, 0).unwrap()
    }

    async fn test_store() -> (SqliteBarStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.db");
        let path = path.to_str().unwrap();

        db::init(path).unwrap();
        let pool = db::create_pool(path).unwrap();
        db::run_migrations(&pool).unwrap();
        let writer = db::spawn_writer(pool.as_ref().clone());

        (SqliteBarStore::new(pool, writer), dir)
    }

    #[tokio::test]
    async fn upsert_and_read_round_trips() {
        let (store, _dir) = test_store().await;

        let written = store
            .upsert_bars(&[bar("AAPL", day(2), Granularity::Daily, "101.25")])
            .await
            .unwrap();
        assert_eq!(written, 1);

        let bars = store
            .bars_in_range(&BarFilter::symbol("AAPL", Granularity::Daily))
            .await
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, dec!(101.25));
        assert_eq!(bars[0].timestamp, day(2));
    }

    #[tokio::test]
    async fn reupserting_a_key_replaces_the_row() {
        let (store, _dir) = test_store().await;

        store
            .upsert_bars(&[bar("AAPL", day(2), Granularity::Daily, "101")])
            .await
            .unwrap();
        store
            .upsert_bars(&[bar("AAPL", day(2), Granularity::Daily, "105.5")])
            .await
            .unwrap();

        let bars = store
            .bars_in_range(&BarFilter::all(Granularity::Daily))
            .await
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, dec!(105.5));
    }

    #[tokio::test]
    async fn granularity_is_part_of_the_key() {
        let (store, _dir) = test_store().await;
        let ts = minute(14, 30);

        store
            .upsert_bars(&[
                bar("SPY", ts, Granularity::Min15, "501"),
                bar("SPY", ts, Granularity::Min30, "502"),
            ])
            .await
            .unwrap();

        let m15 = store
            .bars_in_range(&BarFilter::all(Granularity::Min15))
            .await
            .unwrap();
        let m30 = store
            .bars_in_range(&BarFilter::all(Granularity::Min30))
            .await
            .unwrap();
        assert_eq!(m15.len(), 1);
        assert_eq!(m30.len(), 1);
        assert_eq!(m15[0].close, dec!(501));
        assert_eq!(m30[0].close, dec!(502));
    }

    #[tokio::test]
    async fn range_query_is_ascending_and_bounded() {
        let (store, _dir) = test_store().await;

        // Inserted out of order on purpose.
        store
            .upsert_bars(&[
                bar("MSFT", day(5), Granularity::Daily, "301"),
                bar("MSFT", day(2), Granularity::Daily, "298"),
                bar("MSFT", day(9), Granularity::Daily, "305"),
                bar("MSFT", day(3), Granularity::Daily, "299"),
            ])
            .await
            .unwrap();

        let bars = store
            .bars_in_range(
                &BarFilter::symbol("MSFT", Granularity::Daily)
                    .with_start(day(3))
                    .with_end(day(5)),
            )
            .await
            .unwrap();

        let timestamps: Vec<_> = bars.iter().map(|b| b.timestamp).collect();
        assert_eq!(timestamps, vec![day(3), day(5)]);
    }

    #[tokio::test]
    async fn symbol_filter_excludes_other_symbols() {
        let (store, _dir) = test_store().await;

        store
            .upsert_bars(&[
                bar("AAPL", day(2), Granularity::Daily, "100"),
                bar("MSFT", day(2), Granularity::Daily, "300"),
            ])
            .await
            .unwrap();

        let bars = store
            .bars_in_range(&BarFilter::symbol("AAPL", Granularity::Daily))
            .await
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn clearing_daily_leaves_intraday_untouched() {
        let (store, _dir) = test_store().await;

        store
            .upsert_bars(&[
                bar("AAPL", day(2), Granularity::Daily, "100"),
                bar("AAPL", minute(14, 30), Granularity::Min5, "100.5"),
            ])
            .await
            .unwrap();

        let removed = store.clear_bars(Granularity::Daily, None).await.unwrap();
        assert_eq!(removed, 1);

        let daily = store
            .bars_in_range(&BarFilter::all(Granularity::Daily))
            .await
            .unwrap();
        let intraday = store
            .bars_in_range(&BarFilter::all(Granularity::Min5))
            .await
            .unwrap();
        assert!(daily.is_empty());
        assert_eq!(intraday.len(), 1);
    }

    #[tokio::test]
    async fn clearing_one_timeframe_leaves_others() {
        let (store, _dir) = test_store().await;
        let ts = minute(14, 30);

        store
            .upsert_bars(&[
                bar("SPY", ts, Granularity::Min5, "500"),
                bar("SPY", ts, Granularity::Min15, "501"),
            ])
            .await
            .unwrap();

        store.clear_bars(Granularity::Min5, None).await.unwrap();

        assert!(store
            .bars_in_range(&BarFilter::all(Granularity::Min5))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .bars_in_range(&BarFilter::all(Granularity::Min15))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn clearing_by_symbol_is_targeted() {
        let (store, _dir) = test_store().await;

        store
            .upsert_bars(&[
                bar("AAPL", day(2), Granularity::Daily, "100"),
                bar("MSFT", day(2), Granularity::Daily, "300"),
            ])
            .await
            .unwrap();

        let removed = store
            .clear_bars(Granularity::Daily, Some("AAPL"))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let remaining = store
            .bars_in_range(&BarFilter::all(Granularity::Daily))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].symbol, "MSFT");
    }

    #[tokio::test]
    async fn mixed_granularity_upsert_counts_both_partitions() {
        let (store, _dir) = test_store().await;

        let written = store
            .upsert_bars(&[
                bar("AAPL", day(2), Granularity::Daily, "100"),
                bar("AAPL", minute(14, 30), Granularity::Min1, "100.1"),
                bar("AAPL", minute(14, 31), Granularity::Min1, "100.2"),
            ])
            .await
            .unwrap();
        assert_eq!(written, 3);
    }

    #[tokio::test]
    async fn empty_upsert_is_a_noop() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.upsert_bars(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn intraday_range_bounds_are_inclusive() {
        let (store, _dir) = test_store().await;

        store
            .upsert_bars(&[
                bar("SPY", minute(14, 25), Granularity::Min5, "499"),
                bar("SPY", minute(14, 30), Granularity::Min5, "500"),
                bar("SPY", minute(14, 35), Granularity::Min5, "501"),
                bar("SPY", minute(14, 40), Granularity::Min5, "502"),
            ])
            .await
            .unwrap();

        let bars = store
            .bars_in_range(
                &BarFilter::symbol("SPY", Granularity::Min5)
                    .with_start(minute(14, 30))
                    .with_end(minute(14, 35)),
            )
            .await
            .unwrap();

        let closes: Vec<_> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![dec!(500), dec!(501)]);
    }
}

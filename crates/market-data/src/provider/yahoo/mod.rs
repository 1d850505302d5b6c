//! Yahoo Finance chart adapter.
//!
//! Talks to the unauthenticated v8 chart endpoint
//! (`/v8/finance/chart/{symbol}`) with `period1`/`period2`/`interval`
//! parameters. Rows with null prices (still-forming buckets, vendor gaps)
//! are skipped.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use reqwest::{header, Client};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{Bar, Granularity};
use crate::provider::traits::BarProvider;

use models::{ChartResponse, ChartResult};

const PROVIDER_ID: &str = "YAHOO";
const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo v8 chart API adapter.
pub struct YahooChartProvider {
    client: Client,
    base_url: String,
}

impl Default for YahooChartProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooChartProvider {
    /// Create a new Yahoo chart adapter.
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Yahoo interval string for a granularity.
    fn interval(granularity: Granularity) -> &'static str {
        match granularity {
            Granularity::Daily => "1d",
            Granularity::Min1 => "1m",
            Granularity::Min5 => "5m",
            Granularity::Min15 => "15m",
            Granularity::Min30 => "30m",
            Granularity::Hour1 => "1h",
        }
    }

    /// Zip the chart arrays into bars, skipping incomplete rows.
    fn convert_result(
        symbol: &str,
        granularity: Granularity,
        result: &ChartResult,
    ) -> Vec<Bar> {
        let timestamps = match &result.timestamp {
            Some(ts) if !ts.is_empty() => ts,
            _ => return Vec::new(),
        };
        let quote = match result.indicators.quote.first() {
            Some(q) => q,
            None => return Vec::new(),
        };

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &epoch) in timestamps.iter().enumerate() {
            let row = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                quote.volume.get(i).copied().flatten(),
            );
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
                continue;
            };

            let Some(timestamp) = Utc.timestamp_opt(epoch, 0).single() else {
                continue;
            };
            // Daily rows carry the session-open instant; normalize to
            // date-at-midnight UTC so keys agree across vendors.
            let timestamp = if granularity == Granularity::Daily {
                match timestamp.date_naive().and_hms_opt(0, 0, 0) {
                    Some(naive) => naive.and_utc(),
                    None => continue,
                }
            } else {
                timestamp
            };

            let (Some(open), Some(high), Some(low), Some(close)) = (
                Decimal::from_f64_retain(open),
                Decimal::from_f64_retain(high),
                Decimal::from_f64_retain(low),
                Decimal::from_f64_retain(close),
            ) else {
                continue;
            };
            let Ok(volume) = i64::try_from(volume) else {
                continue;
            };

            bars.push(Bar::ohlcv(
                symbol, timestamp, granularity, open, high, low, close, volume,
            ));
        }
        bars
    }
}

#[async_trait]
impl BarProvider for YahooChartProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Vec<Bar>, MarketDataError> {
        debug!(
            "Fetching {} bars for {} from {} to {} from Yahoo",
            granularity,
            symbol,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = start.timestamp().to_string();
        let period2 = end.timestamp().to_string();
        let params = [
            ("period1", period1.as_str()),
            ("period2", period2.as_str()),
            ("interval", Self::interval(granularity)),
            ("includePrePost", "false"),
            ("events", "history"),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    MarketDataError::Transient {
                        provider: PROVIDER_ID.to_string(),
                        message: e.to_string(),
                    }
                } else {
                    MarketDataError::Network(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MarketDataError::Unauthenticated {
                provider: PROVIDER_ID.to_string(),
            });
        }
        // Unknown symbols come back as 404 with a chart error body; treat
        // them as an empty result rather than an adapter failure.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if status.is_server_error() {
            return Err(MarketDataError::Unavailable {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::Transient {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let data: ChartResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::Transient {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Failed to parse chart response: {}", e),
                })?;

        if let Some(err) = &data.chart.error {
            let code = err.code.as_deref().unwrap_or("");
            if code.eq_ignore_ascii_case("not found") {
                return Ok(Vec::new());
            }
            return Err(MarketDataError::Transient {
                provider: PROVIDER_ID.to_string(),
                message: err
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("chart error: {}", code)),
            });
        }

        let mut bars = data
            .chart
            .result
            .as_deref()
            .and_then(|r| r.first())
            .map(|r| Self::convert_result(symbol, granularity, r))
            .unwrap_or_default();

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

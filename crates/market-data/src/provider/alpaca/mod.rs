//! Alpaca market data adapter.
//!
//! Talks to the Alpaca Data API v2 (`/v2/stocks/{symbol}/bars`) with
//! key/secret header auth. Supports daily and all intraday granularities;
//! large ranges are paginated via `next_page_token`.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{Bar, Granularity};
use crate::provider::traits::BarProvider;

use models::{AlpacaBar, AlpacaBarsResponse, AlpacaErrorResponse};

const PROVIDER_ID: &str = "ALPACA";
const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets";
const PAGE_LIMIT: &str = "10000";

/// Alpaca Data API adapter.
pub struct AlpacaProvider {
    client: Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl AlpacaProvider {
    /// Create a new Alpaca adapter with the given key pair.
    pub fn new(api_key: String, api_secret: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            api_secret,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (test servers, paper endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Alpaca timeframe string for a granularity.
    fn timeframe(granularity: Granularity) -> &'static str {
        match granularity {
            Granularity::Daily => "1Day",
            Granularity::Min1 => "1Min",
            Granularity::Min5 => "5Min",
            Granularity::Min15 => "15Min",
            Granularity::Min30 => "30Min",
            Granularity::Hour1 => "1Hour",
        }
    }

    /// Fetch one page of bars, mapping HTTP statuses onto the error taxonomy.
    async fn fetch_page(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
        page_token: Option<&str>,
    ) -> Result<AlpacaBarsResponse, MarketDataError> {
        let url = format!("{}/v2/stocks/{}/bars", self.base_url, symbol);
        let start_param = start.to_rfc3339();
        let end_param = end.to_rfc3339();

        let mut params: Vec<(&str, &str)> = vec![
            ("timeframe", Self::timeframe(granularity)),
            ("start", &start_param),
            ("end", &end_param),
            ("limit", PAGE_LIMIT),
            ("adjustment", "raw"),
        ];
        if let Some(token) = page_token {
            params.push(("page_token", token));
        }

        debug!("Alpaca request: {} {:?}", url, Self::timeframe(granularity));

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
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
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MarketDataError::Unauthenticated {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if status.is_server_error() {
            return Err(MarketDataError::Unavailable {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }
        if !status.is_success() {
            let detail = response
                .json::<AlpacaErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(MarketDataError::Transient {
                provider: PROVIDER_ID.to_string(),
                message: detail,
            });
        }

        response
            .json::<AlpacaBarsResponse>()
            .await
            .map_err(|e| MarketDataError::Transient {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse bars response: {}", e),
            })
    }

    /// Convert one Alpaca bar, rejecting values unrepresentable as Decimal.
    fn convert_bar(
        symbol: &str,
        granularity: Granularity,
        raw: AlpacaBar,
    ) -> Option<Bar> {
        let open = Decimal::from_f64_retain(raw.open)?;
        let high = Decimal::from_f64_retain(raw.high)?;
        let low = Decimal::from_f64_retain(raw.low)?;
        let close = Decimal::from_f64_retain(raw.close)?;
        let volume = i64::try_from(raw.volume).ok()?;

        // Daily bars carry the vendor's session-open offset; normalize to
        // date-at-midnight UTC so keys agree across vendors.
        let timestamp = if granularity == Granularity::Daily {
            raw.timestamp
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())?
        } else {
            raw.timestamp
        };

        Some(Bar::ohlcv(
            symbol, timestamp, granularity, open, high, low, close, volume,
        ))
    }
}

#[async_trait]
impl BarProvider for AlpacaProvider {
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
            "Fetching {} bars for {} from {} to {} from Alpaca",
            granularity,
            symbol,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let mut bars: Vec<Bar> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .fetch_page(symbol, start, end, granularity, page_token.as_deref())
                .await?;

            for raw in page.bars.unwrap_or_default() {
                match Self::convert_bar(symbol, granularity, raw) {
                    Some(bar) => bars.push(bar),
                    None => warn!("Skipping unconvertible Alpaca bar for {}", symbol),
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

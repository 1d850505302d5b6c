//! Serde models for the Alpaca market data API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response shape of `GET /v2/stocks/{symbol}/bars`.
#[derive(Debug, Deserialize)]
pub struct AlpacaBarsResponse {
    /// Absent (or null) when the symbol has no bars for the range.
    pub bars: Option<Vec<AlpacaBar>>,
    pub next_page_token: Option<String>,
}

/// One bar as returned by Alpaca.
#[derive(Debug, Deserialize)]
pub struct AlpacaBar {
    /// Bar open timestamp, RFC 3339.
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: u64,
}

/// Error body Alpaca returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct AlpacaErrorResponse {
    pub message: Option<String>,
}

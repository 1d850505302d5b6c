//! Barvault Market Data Crate
//!
//! Vendor-agnostic OHLCV bar fetching with automatic failover.
//!
//! # Overview
//!
//! This crate supports:
//! - Multiple vendor adapters behind one fetch contract ([`BarProvider`])
//! - Static-order failover with per-adapter diagnostics ([`FailoverRouter`])
//! - Lock-free per-adapter health tracking ([`HealthTracker`])
//! - Bounded retries with exponential backoff and jitter
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  FailoverRouter  |  (ordered adapter list, skip unavailable)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  Retry Executor  | --> |  HealthTracker   |  (every attempt reported)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |   BarProvider    |  (Alpaca, Yahoo chart, ...)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |       Bar        |  (validated OHLCV)
//! +------------------+
//! ```

pub mod errors;
pub mod health;
pub mod models;
pub mod provider;
pub mod retry;
pub mod router;
pub mod validator;

pub use errors::{FailureKind, MarketDataError, ProviderAttempt, RetryClass};
pub use health::{HealthPolicy, HealthTracker, ProviderHealthReport};
pub use models::{Bar, Granularity, ParseGranularityError};
pub use provider::{AlpacaProvider, BarProvider, YahooChartProvider};
pub use retry::RetryPolicy;
pub use router::{FailoverRouter, RoutedBars};

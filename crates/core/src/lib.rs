//! Barvault Core Crate
//!
//! The acquisition engine behind the cache: validated configuration, the
//! storage contract, the acquisition facade and batch scheduling.
//!
//! # Consistency contract
//!
//! For every successful acquisition call, the bars returned to the caller
//! are exactly the bars newly upserted into the cache - by count and by
//! primary key. Context fetched from a vendor for correctness is sliced
//! away before anything is persisted.
//!
//! # Core Types
//!
//! - [`AcquisitionService`] - the facade external collaborators call
//! - [`BarStore`] - the storage seam implemented by the sqlite crate
//! - [`EngineConfig`] - all tunable parameters, validated at startup
//! - [`Watchlist`] - externally owned symbol list, read-only input

pub mod bars;
pub mod config;
pub mod errors;
pub mod watchlist;

pub use bars::{
    build_router, Acquisition, AcquisitionService, BarFilter, BarStore, BatchOperation,
    BatchProgress, BatchReport, CancelFlag, LatestAcquisition, SymbolOutcome,
};
pub use config::EngineConfig;
pub use errors::{DatabaseError, Error, Result};
pub use watchlist::Watchlist;

// Re-export the market data surface callers need alongside the facade.
pub use barvault_market_data::{
    Bar, FailoverRouter, Granularity, HealthPolicy, MarketDataError, ProviderHealthReport,
    RetryPolicy,
};

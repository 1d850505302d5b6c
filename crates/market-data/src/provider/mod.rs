//! Vendor adapters implementing the common bar-fetch contract.

pub mod alpaca;
pub mod traits;
pub mod yahoo;

pub use alpaca::AlpacaProvider;
pub use traits::BarProvider;
pub use yahoo::YahooChartProvider;

//! Domain models shared by adapters, the router and downstream crates.

mod bar;
mod granularity;

pub use bar::Bar;
pub use granularity::{Granularity, ParseGranularityError};

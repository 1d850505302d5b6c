//! Bar acquisition: facade, batch scheduling and the store contract.

mod batch;
mod client;
mod service;
mod store;


pub use batch::{BatchOperation, BatchProgress, BatchReport, CancelFlag, SymbolOutcome};
pub use client::build_router;
pub use service::{Acquisition, AcquisitionService, LatestAcquisition};
pub use store::{BarFilter, BarStore};

//! Bar cache repository and its database models.

pub mod model;
pub mod repository;

pub use repository::SqliteBarStore;

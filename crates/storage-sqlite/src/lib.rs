//! SQLite storage implementation for Barvault.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the `BarStore` trait defined in
//! `barvault-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations for the daily and intraday bar partitions
//! - The single-writer actor that serializes cache writes
//!
//! # Architecture
//!
//! This crate is the only place where Diesel dependencies exist. The core
//! and market-data crates are database-agnostic and work with traits.
//!
//! ```text
//!   core (facade, BarStore trait)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod bars;
pub mod db;
pub mod errors;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export the store and storage errors
pub use bars::SqliteBarStore;
pub use errors::{IntoCore, StorageError};

// Re-export from barvault-core for convenience
pub use barvault_core::errors::{DatabaseError, Error, Result};

//! SQLite storage implementation for the ALM reconciliation engine.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in `alm-core`
//! and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for the event ledger, daily summaries,
//!   NAV observations, and import runs
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel
//! dependencies exist. `alm-core` is database-agnostic and works with
//! traits; writes are serialized through a single-writer actor so that
//! dedup appends never race.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod events;
pub mod import;
pub mod reconciliation;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from alm-core for convenience
pub use alm_core::errors::{DatabaseError, Error, Result};

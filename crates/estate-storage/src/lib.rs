//! Estate Desk Storage Layer
//!
//! SQLite-backed key-value persistence that survives process restarts.
//! The session layer keeps the credential pair here; multi-key writes
//! go through a single transaction.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

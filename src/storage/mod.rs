//! Storage module for persisting stock snapshots
//!
//! This module handles all database operations for the service, including:
//! - SQLite database initialization and schema management
//! - Atomic per-category snapshot replacement
//! - Point and aggregate snapshot reads for the API

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{SnapshotStore, StoreError, StoreResult};

use crate::StockError;

use std::path::Path;

/// Initializes or opens the snapshot database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(StockError)` - Failed to initialize store
pub fn open_store(path: &Path) -> Result<SqliteStore, StockError> {
    Ok(SqliteStore::new(path)?)
}

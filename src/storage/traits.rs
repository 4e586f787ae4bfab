//! Storage traits and error types
//!
//! This module defines the trait interface for snapshot storage backends
//! and associated error types.

use crate::model::{Category, CategorySnapshot, Item, StockState};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for snapshot storage backends
///
/// Exactly one snapshot per category is kept. `replace` swaps a category's
/// items wholesale inside one atomic unit, so readers observe either the
/// old item set or the new one, never a mixture.
pub trait SnapshotStore {
    /// Replaces a category's items with a freshly captured set
    ///
    /// # Arguments
    ///
    /// * `category` - The category being replaced
    /// * `items` - The new item list, in page order
    /// * `captured_at` - Capture timestamp, shared by every category
    ///   written in the same extraction cycle
    fn replace(
        &mut self,
        category: Category,
        items: &[Item],
        captured_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Gets the current snapshot for one category
    ///
    /// Returns `None` for a category that has never been written. A category
    /// replaced with zero items comes back as `Some` with an empty list.
    fn get(&self, category: Category) -> StoreResult<Option<CategorySnapshot>>;

    /// Gets all current snapshots plus the derived global last-updated stamp
    ///
    /// `last_updated` is the most recent `captured_at` across present
    /// snapshots, or `None` when nothing has been captured yet.
    fn get_all(&self) -> StoreResult<StockState>;
}

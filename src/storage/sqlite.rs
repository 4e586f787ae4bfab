//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the SnapshotStore trait.

use crate::model::{Category, CategorySnapshot, Item, StockState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{SnapshotStore, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite snapshot store backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// Opens (or creates) the database file and initializes the schema. An
    /// existing file rehydrates previously captured snapshots, so the read
    /// API can serve data from before a restart.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| StoreError::InvalidTimestamp(raw.to_string()))
    }
}

impl SnapshotStore for SqliteStore {
    fn replace(
        &mut self,
        category: Category,
        items: &[Item],
        captured_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let key = category.as_key();
        let stamp = captured_at.to_rfc3339();

        // The transaction is the atomicity boundary: readers see the old
        // item set or the new one, never the gap between delete and insert.
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM stock WHERE category = ?1", params![key])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO stock (category, name, stock, price, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for item in items {
                stmt.execute(params![key, item.name, item.quantity, item.unit_price, stamp])?;
            }
        }
        tx.execute(
            "INSERT INTO stock_snapshots (category, captured_at) VALUES (?1, ?2)
             ON CONFLICT(category) DO UPDATE SET captured_at = excluded.captured_at",
            params![key, stamp],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get(&self, category: Category) -> StoreResult<Option<CategorySnapshot>> {
        let key = category.as_key();

        // Absence of a snapshot row means the category was never captured
        let raw_stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT captured_at FROM stock_snapshots WHERE category = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let raw_stamp = match raw_stamp {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let captured_at = Self::parse_timestamp(&raw_stamp)?;

        let mut stmt = self.conn.prepare(
            "SELECT name, stock, price FROM stock WHERE category = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![key], |row| {
                Ok(Item {
                    name: row.get(0)?,
                    quantity: row.get(1)?,
                    unit_price: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CategorySnapshot {
            category,
            items,
            captured_at,
        }))
    }

    fn get_all(&self) -> StoreResult<StockState> {
        let mut state = StockState::default();

        for category in Category::ALL {
            if let Some(snapshot) = self.get(category)? {
                if state
                    .last_updated
                    .map_or(true, |existing| snapshot.captured_at > existing)
                {
                    state.last_updated = Some(snapshot.captured_at);
                }
                state.snapshots.insert(category, snapshot);
            }
        }

        Ok(state)
    }
}

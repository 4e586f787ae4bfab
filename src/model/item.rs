//! Item records and snapshot aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Category;

/// A single stocked item within one category
///
/// Serializes with the wire/database field names (`stock`, `price`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    /// Quantity in stock, from the page's " xN" suffix (1 when absent)
    #[serde(rename = "stock")]
    pub quantity: u32,
    /// Unit price; the page does not currently expose one, so always 0
    #[serde(rename = "price")]
    pub unit_price: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price: 0,
        }
    }
}

/// The full item list for one category as of one extraction cycle
///
/// Items keep page order. All items in a snapshot share `captured_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySnapshot {
    pub category: Category,
    pub items: Vec<Item>,
    pub captured_at: DateTime<Utc>,
}

/// Latest snapshot per category plus the derived global last-updated stamp
///
/// Categories never written are absent from `snapshots`. `last_updated` is
/// the most recent `captured_at` across present snapshots, or `None` when
/// nothing has been captured yet.
#[derive(Debug, Clone, Default)]
pub struct StockState {
    pub snapshots: HashMap<Category, CategorySnapshot>,
    pub last_updated: Option<DateTime<Utc>>,
}

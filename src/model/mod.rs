//! Core data model for stock snapshots
//!
//! This module defines the types shared across the scraper, store, and API:
//! - The five fixed stock categories and their heading-label mapping
//! - Item records as extracted from the page
//! - Per-category snapshots and the aggregate store state

mod category;
mod item;

pub use category::Category;
pub use item::{CategorySnapshot, Item, StockState};

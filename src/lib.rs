//! Garden-Stock: an adaptive stock page extraction service
//!
//! This crate periodically scrapes a game-item stock page, derives its own
//! polling cadence from countdown hints embedded in the page, persists the
//! latest snapshot per category, and serves it over a small JSON read API.

pub mod api;
pub mod config;
pub mod model;
pub mod scrape;
pub mod storage;

use thiserror::Error;

/// Main error type for garden-stock operations
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] scrape::FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] scrape::ParseError),

    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for garden-stock operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{Category, CategorySnapshot, Item, StockState};
pub use scrape::{CycleOutcome, ExtractionCycle, HttpFetcher, PageFetcher};
pub use storage::{SnapshotStore, SqliteStore};

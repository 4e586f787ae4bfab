//! Stock page extraction
//!
//! This module contains the core extraction logic, including:
//! - HTTP fetching with egress profile rotation
//! - Stock page parsing and countdown interpretation
//! - The fetch, parse, store, reschedule cycle
//! - Adaptive scheduling of future cycles
//!
//! The rest of the crate drives extraction through [`run_scheduler`] or,
//! for one-shot runs, [`ExtractionCycle::run_once`].

mod cycle;
mod fetcher;
mod parser;
mod scheduler;

pub use cycle::{CycleOutcome, ExtractionCycle, FAILURE_RETRY_SECS, IDLE_RETRY_SECS};
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use parser::{
    parse_stock_page, parse_update_time, ParseError, ParsedCategory, ParsedStock,
    DEFAULT_UPDATE_SECS, MIN_UPDATE_SECS,
};
pub use scheduler::{run_scheduler, AdaptiveScheduler, RefreshRequest, ScheduleState};

use crate::config::Config;
use crate::storage::SqliteStore;
use crate::StockError;
use std::sync::{Arc, Mutex};

/// Builds an extraction cycle from the loaded configuration
///
/// This is the single construction point used by both the serving loop
/// and one-shot runs: it wires the configured egress profiles to the
/// shared snapshot store.
///
/// # Arguments
///
/// * `config` - The service configuration
/// * `store` - Shared handle to the snapshot store
///
/// # Returns
///
/// * `Ok(ExtractionCycle)` - Ready-to-run cycle
/// * `Err(StockError)` - An HTTP client could not be constructed
pub fn build_cycle(
    config: &Config,
    store: Arc<Mutex<SqliteStore>>,
) -> Result<ExtractionCycle<HttpFetcher>, StockError> {
    let fetcher = HttpFetcher::new(config)?;
    Ok(ExtractionCycle::new(
        fetcher,
        store,
        config.scraper.fetch_attempts,
    ))
}

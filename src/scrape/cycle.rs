//! Extraction cycle orchestration
//!
//! One cycle is a single fetch -> parse -> store pass plus the decision of
//! when the next cycle should run. The cycle is total: every code path
//! resolves to exactly one [`CycleOutcome`], and every outcome carries a
//! next delay, so the caller can always re-arm its timer.

use crate::model::Category;
use crate::scrape::fetcher::PageFetcher;
use crate::scrape::parser::{parse_stock_page, ParsedStock};
use crate::storage::{SnapshotStore, SqliteStore};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Delay when a cycle produced nothing usable but transport was fine (seconds)
pub const IDLE_RETRY_SECS: u64 = 300;

/// Delay after a transport-level failure (seconds)
///
/// Shorter than the idle delay, but still backed off far enough that a bot
/// block is not answered with a burst of immediate retries.
pub const FAILURE_RETRY_SECS: u64 = 120;

/// Classified result of one extraction cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Markup was fetched and parsed; carries the countdown hint for every
    /// recognized category
    Success { next_update: HashMap<Category, u64> },

    /// Markup was fetched but no recognizable container was present
    ParseFailure,

    /// The single configured fetch attempt failed
    TransportFailure,

    /// Every attempt in a multi-attempt fetch budget failed
    Exhausted,
}

impl CycleOutcome {
    /// Seconds until the next cycle should run
    ///
    /// | Outcome | Delay |
    /// |---------|-------|
    /// | Success with hints | smallest hint |
    /// | Success without hints | 300s |
    /// | ParseFailure | 300s |
    /// | TransportFailure / Exhausted | 120s |
    pub fn next_delay(&self) -> Duration {
        let seconds = match self {
            CycleOutcome::Success { next_update } => next_update
                .values()
                .copied()
                .min()
                .unwrap_or(IDLE_RETRY_SECS),
            CycleOutcome::ParseFailure => IDLE_RETRY_SECS,
            CycleOutcome::TransportFailure | CycleOutcome::Exhausted => FAILURE_RETRY_SECS,
        };
        Duration::from_secs(seconds)
    }
}

/// Runs extraction cycles against one fetcher and one snapshot store
pub struct ExtractionCycle<F: PageFetcher> {
    fetcher: F,
    store: Arc<Mutex<SqliteStore>>,
    attempts: u32,
}

impl<F: PageFetcher> ExtractionCycle<F> {
    /// Creates a new cycle runner
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The page fetch backend
    /// * `store` - Shared snapshot store, also read by the API
    /// * `attempts` - Fetch budget per cycle (clamped to at least 1)
    pub fn new(fetcher: F, store: Arc<Mutex<SqliteStore>>, attempts: u32) -> Self {
        Self {
            fetcher,
            store,
            attempts: attempts.max(1),
        }
    }

    /// Runs one fetch -> parse -> store pass and classifies the result
    ///
    /// A storage failure for an individual category is logged and does not
    /// change the classification; its countdown hint is still collected.
    pub async fn run_once(&self) -> CycleOutcome {
        let markup = match self.fetch_with_retries().await {
            Some(markup) => markup,
            None => {
                if self.attempts == 1 {
                    return CycleOutcome::TransportFailure;
                }
                return CycleOutcome::Exhausted;
            }
        };

        let parsed = match parse_stock_page(&markup) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Stock page structure not recognized: {}", e);
                return CycleOutcome::ParseFailure;
            }
        };

        self.store_snapshots(parsed)
    }

    /// Fetches the page, rotating egress profiles across the attempt budget
    async fn fetch_with_retries(&self) -> Option<String> {
        for attempt in 0..self.attempts {
            match self.fetcher.fetch_page(attempt).await {
                Ok(markup) => return Some(markup),
                Err(e) if e.is_likely_bot_block() => {
                    tracing::warn!(
                        "Fetch attempt {}/{} looks bot-blocked: {}",
                        attempt + 1,
                        self.attempts,
                        e
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Fetch attempt {}/{} failed: {}",
                        attempt + 1,
                        self.attempts,
                        e
                    );
                }
            }
        }
        None
    }

    /// Replaces every recognized category's snapshot and collects hints
    fn store_snapshots(&self, parsed: ParsedStock) -> CycleOutcome {
        // One shared timestamp for every category captured in this cycle
        let captured_at = Utc::now();
        let mut next_update = HashMap::new();

        for (category, listing) in parsed.categories {
            {
                let mut store = self.store.lock().unwrap();
                if let Err(e) = store.replace(category, &listing.items, captured_at) {
                    tracing::error!("Failed to store {} snapshot: {}", category.as_key(), e);
                }
            }

            // Hint collection is independent of the write result
            next_update.insert(category, listing.next_update_seconds);
        }

        if next_update.is_empty() {
            tracing::warn!("Parse succeeded but no categories were recognized");
        } else {
            tracing::info!("Captured {} categories", next_update.len());
        }

        CycleOutcome::Success { next_update }
    }
}

//! Adaptive scheduling of extraction cycles
//!
//! The service re-arms itself after every cycle instead of polling on a
//! fixed interval: each cycle's outcome decides how long to wait before
//! the next one. This module owns that single pending timer and the loop
//! that drives cycles from it, interleaved with manual refresh requests.

use crate::scrape::cycle::{CycleOutcome, ExtractionCycle, IDLE_RETRY_SECS};
use crate::scrape::fetcher::PageFetcher;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// Scheduling state of the extraction loop
///
/// There is never more than one pending fire: arming a new one replaces
/// the old one, and firing or cancelling returns the state to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// No cycle is scheduled
    Idle,
    /// Exactly one cycle is scheduled at the given instant
    Armed {
        /// When the pending cycle fires
        fire_at: Instant,
    },
}

/// Owns the single pending timer for the extraction loop
///
/// Every transition goes through `schedule`, `fire`, or `cancel`, so at
/// most one fire can be pending at any time.
#[derive(Debug)]
pub struct AdaptiveScheduler {
    state: ScheduleState,
}

impl AdaptiveScheduler {
    /// Creates a new scheduler with nothing pending
    pub fn new() -> Self {
        Self {
            state: ScheduleState::Idle,
        }
    }

    /// Replaces any pending fire with a new one after `delay`
    ///
    /// # Arguments
    ///
    /// * `delay` - How long to wait before the next cycle
    ///
    /// # Returns
    ///
    /// The instant the new fire is armed for
    pub fn schedule(&mut self, delay: Duration) -> Instant {
        self.cancel();
        let fire_at = Instant::now() + delay;
        self.state = ScheduleState::Armed { fire_at };
        fire_at
    }

    /// Cancels the pending fire, if any
    pub fn cancel(&mut self) {
        self.state = ScheduleState::Idle;
    }

    /// Consumes the pending fire when its timer goes off
    pub fn fire(&mut self) {
        self.state = ScheduleState::Idle;
    }

    /// Returns the instant of the pending fire, if armed
    pub fn pending_fire_at(&self) -> Option<Instant> {
        match self.state {
            ScheduleState::Armed { fire_at } => Some(fire_at),
            ScheduleState::Idle => None,
        }
    }

    /// Returns true if a cycle is scheduled
    pub fn is_armed(&self) -> bool {
        matches!(self.state, ScheduleState::Armed { .. })
    }
}

impl Default for AdaptiveScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A manual refresh request for the scheduler loop
///
/// The reply fires once the requested cycle has completed and the next
/// cycle has been armed from its outcome.
#[derive(Debug)]
pub struct RefreshRequest {
    /// Receives the outcome of the cycle run for this request
    pub reply: oneshot::Sender<CycleOutcome>,
}

/// Runs the extraction loop until the refresh channel closes
///
/// One cycle runs immediately at startup. After that, cycles are driven
/// by the pending timer and by manual refresh requests. Both paths run
/// the cycle inline, so cycles never overlap; requests that arrive while
/// a cycle is in flight wait in the channel and are served in order. The
/// pending fire is always cancelled before a new one is armed, and every
/// cycle ends by arming the next one.
///
/// # Arguments
///
/// * `cycle` - The extraction cycle to run
/// * `requests` - Channel of manual refresh requests
pub async fn run_scheduler<F: PageFetcher>(
    cycle: ExtractionCycle<F>,
    mut requests: mpsc::Receiver<RefreshRequest>,
) {
    let mut timer = AdaptiveScheduler::new();

    let outcome = cycle.run_once().await;
    let delay = outcome.next_delay();
    timer.schedule(delay);
    tracing::info!("Startup cycle complete, next cycle in {}s", delay.as_secs());

    loop {
        let fire_at = match timer.pending_fire_at() {
            Some(instant) => instant,
            // Every branch below re-arms, so this cannot be reached; an
            // unarmed loop must never persist, so fall back to the idle delay
            None => timer.schedule(Duration::from_secs(IDLE_RETRY_SECS)),
        };

        tokio::select! {
            _ = tokio::time::sleep_until(fire_at) => {
                timer.fire();
                let outcome = cycle.run_once().await;
                let delay = outcome.next_delay();
                timer.schedule(delay);
                tracing::debug!("Scheduled cycle complete, next cycle in {}s", delay.as_secs());
            }
            request = requests.recv() => {
                match request {
                    Some(request) => {
                        timer.cancel();
                        let outcome = cycle.run_once().await;
                        let delay = outcome.next_delay();
                        timer.schedule(delay);
                        tracing::info!("Manual refresh complete, next cycle in {}s", delay.as_secs());
                        // The requester may have hung up; nothing to do then
                        let _ = request.reply.send(outcome);
                    }
                    None => {
                        timer.cancel();
                        tracing::info!("Refresh channel closed, stopping scheduler");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::scrape::fetcher::FetchError;
    use crate::storage::{SnapshotStore, SqliteStore};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Returns a page body whose seeds section carries a one minute countdown
    fn one_minute_page() -> String {
        r#"
        <html><body><main>
            <div>
                <h2>Seeds</h2>
                <p>UPDATES IN: 01m 00s</p>
                <ul><li>Carrot x4</li></ul>
            </div>
        </main></body></html>
        "#
        .to_string()
    }

    struct CountingFetcher {
        calls: Arc<AtomicU32>,
        body: String,
    }

    impl PageFetcher for CountingFetcher {
        async fn fetch_page(&self, _attempt: u32) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    fn create_test_cycle(calls: Arc<AtomicU32>) -> ExtractionCycle<CountingFetcher> {
        let store = Arc::new(Mutex::new(
            SqliteStore::new_in_memory().unwrap(),
        ));
        let fetcher = CountingFetcher {
            calls,
            body: one_minute_page(),
        };
        ExtractionCycle::new(fetcher, store, 1)
    }

    #[test]
    fn test_new_scheduler_is_idle() {
        let scheduler = AdaptiveScheduler::new();

        assert!(!scheduler.is_armed());
        assert!(scheduler.pending_fire_at().is_none());
    }

    #[test]
    fn test_schedule_arms_one_fire() {
        let mut scheduler = AdaptiveScheduler::new();

        let fire_at = scheduler.schedule(Duration::from_secs(60));

        assert!(scheduler.is_armed());
        assert_eq!(scheduler.pending_fire_at(), Some(fire_at));
    }

    #[test]
    fn test_schedule_replaces_pending_fire() {
        let mut scheduler = AdaptiveScheduler::new();

        let first = scheduler.schedule(Duration::from_secs(600));
        let second = scheduler.schedule(Duration::from_secs(1));

        assert!(second < first);
        assert_eq!(scheduler.pending_fire_at(), Some(second));
    }

    #[test]
    fn test_cancel_disarms() {
        let mut scheduler = AdaptiveScheduler::new();

        scheduler.schedule(Duration::from_secs(60));
        scheduler.cancel();

        assert!(!scheduler.is_armed());
    }

    #[test]
    fn test_fire_consumes_pending_fire() {
        let mut scheduler = AdaptiveScheduler::new();

        scheduler.schedule(Duration::from_secs(60));
        scheduler.fire();

        assert!(!scheduler.is_armed());
        assert!(scheduler.pending_fire_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_startup_cycle() {
        let calls = Arc::new(AtomicU32::new(0));
        let cycle = create_test_cycle(calls.clone());
        let (sender, receiver) = mpsc::channel(4);

        let handle = tokio::spawn(run_scheduler(cycle, receiver));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_rearms_after_timer_fire() {
        let calls = Arc::new(AtomicU32::new(0));
        let cycle = create_test_cycle(calls.clone());
        let (sender, receiver) = mpsc::channel(4);

        let handle = tokio::spawn(run_scheduler(cycle, receiver));

        // Startup cycle arms a 60 second timer from the page countdown
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_runs_cycle_and_replies() {
        let calls = Arc::new(AtomicU32::new(0));
        let cycle = create_test_cycle(calls.clone());
        let (sender, receiver) = mpsc::channel(4);

        let handle = tokio::spawn(run_scheduler(cycle, receiver));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (reply_sender, reply_receiver) = oneshot::channel();
        sender
            .send(RefreshRequest {
                reply: reply_sender,
            })
            .await
            .unwrap();
        let outcome = reply_receiver.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match outcome {
            CycleOutcome::Success { next_update } => {
                assert_eq!(next_update.get(&Category::Seeds), Some(&60));
            }
            other => panic!("expected success outcome, got {:?}", other),
        }

        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_resets_pending_timer() {
        let calls = Arc::new(AtomicU32::new(0));
        let cycle = create_test_cycle(calls.clone());
        let (sender, receiver) = mpsc::channel(4);

        let handle = tokio::spawn(run_scheduler(cycle, receiver));
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Refresh at t+30; the old t+60 fire is replaced by one at t+90
        tokio::time::sleep(Duration::from_secs(29)).await;
        let (reply_sender, reply_receiver) = oneshot::channel();
        sender
            .send(RefreshRequest {
                reply: reply_sender,
            })
            .await
            .unwrap();
        reply_receiver.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The original fire instant passes without a cycle
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The replacement fire runs the next cycle
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_refreshes_run_in_order() {
        let calls = Arc::new(AtomicU32::new(0));
        let cycle = create_test_cycle(calls.clone());
        let (sender, receiver) = mpsc::channel(4);

        let handle = tokio::spawn(run_scheduler(cycle, receiver));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let (first_sender, first_receiver) = oneshot::channel();
        let (second_sender, second_receiver) = oneshot::channel();
        sender
            .send(RefreshRequest {
                reply: first_sender,
            })
            .await
            .unwrap();
        sender
            .send(RefreshRequest {
                reply: second_sender,
            })
            .await
            .unwrap();

        first_receiver.await.unwrap();
        second_receiver.await.unwrap();

        // Startup plus one full cycle per request
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_stops_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let cycle = create_test_cycle(calls.clone());
        let (sender, receiver) = mpsc::channel::<RefreshRequest>(4);

        let handle = tokio::spawn(run_scheduler(cycle, receiver));
        tokio::time::sleep(Duration::from_secs(1)).await;

        drop(sender);
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

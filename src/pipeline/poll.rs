//! Scheduled re-resolution of tracked products.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{Instant, MissedTickBehavior};

use crate::models::ProductEvent;
use crate::pipeline::track::Tracker;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Records in the store when the cycle started
    pub tracked: usize,
    pub refreshed: usize,
    pub failed: usize,
    pub events: Vec<ProductEvent>,
}

impl CycleReport {
    pub fn restock_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ProductEvent::Restock { .. }))
            .count()
    }
}

/// Refreshes every tracked product on a fixed interval.
pub struct Poller {
    tracker: Arc<Tracker>,
    interval: Duration,
    concurrency: usize,
}

impl Poller {
    pub fn new(tracker: Arc<Tracker>, interval: Duration, concurrency: usize) -> Self {
        Self {
            tracker,
            interval,
            concurrency: concurrency.max(1),
        }
    }

    /// Refresh every record once.
    ///
    /// A failing product is logged and stays tracked; the rest of the cycle
    /// carries on.
    pub async fn run_cycle(&self) -> CycleReport {
        let records = self.tracker.list().await;
        let mut report = CycleReport {
            tracked: records.len(),
            ..CycleReport::default()
        };

        let tracker = &self.tracker;
        let mut results = stream::iter(records)
            .map(|record| async move {
                let result = tracker.refresh(&record).await;
                (record, result)
            })
            .buffer_unordered(self.concurrency);

        while let Some((record, result)) = results.next().await {
            match result {
                Ok(outcome) => {
                    report.refreshed += 1;
                    report.events.extend(outcome.events);
                }
                Err(error) => {
                    report.failed += 1;
                    log::warn!(
                        "Failed to refresh {} ({}): {}",
                        record.product_id(),
                        record.product.url,
                        error
                    );
                }
            }
        }

        log::info!(
            "Poll cycle: {}/{} refreshed, {} failed, {} restocks",
            report.refreshed,
            report.tracked,
            report.failed,
            report.restock_count()
        );
        report
    }

    /// Run cycles on the interval until `shutdown` completes.
    ///
    /// The first cycle starts one interval from now. A cycle that outlasts
    /// the interval delays the next tick instead of overlapping it.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);
        let mut cycles = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Poller stopping after {} cycles", cycles);
                    return cycles;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                    cycles += 1;
                }
            }
        }
    }
}

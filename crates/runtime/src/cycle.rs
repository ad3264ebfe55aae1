//! Fixed-cadence cycle scheduler
//!
//! Runs an immediate first cycle at startup, then one cycle per interval
//! tick. Ticks that arrive while a cycle is still running are skipped, not
//! queued; a slow cycle therefore delays work to the next tick instead of
//! piling up.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Schedules non-overlapping cycles on a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct CycleScheduler {
    interval: Duration,
}

impl CycleScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run cycles until the token is cancelled.
    ///
    /// The first cycle starts immediately. A cancellation observed between
    /// cycles exits promptly; a cycle already in flight runs to completion.
    pub async fn run<F, Fut>(&self, cancel: CancellationToken, mut cycle: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        cycle().await;

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // An interval's first tick completes immediately; the immediate
        // cycle above already covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => cycle().await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_immediate_first_cycle_then_ticks() {
        let count = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let scheduler = CycleScheduler::new(Duration::from_secs(60));
        let runs = count.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            scheduler
                .run(token, move || {
                    let runs = runs.clone();
                    async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .await;
        });

        // First cycle runs without any time passing.
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_scheduling() {
        let count = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let scheduler = CycleScheduler::new(Duration::from_secs(10));
        let runs = count.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            scheduler
                .run(token, move || {
                    let runs = runs.clone();
                    async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .await;
        });

        tokio::task::yield_now().await;
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycle_skips_missed_ticks() {
        let count = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let scheduler = CycleScheduler::new(Duration::from_secs(10));
        let runs = count.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            scheduler
                .run(token, move || {
                    let runs = runs.clone();
                    async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        // Cycle takes 2.5 intervals.
                        tokio::time::sleep(Duration::from_secs(25)).await;
                    }
                })
                .await;
        });

        // First cycle runs t=0..25. The ticker only starts once it ends,
        // so the second cycle begins one interval later at t=35; no missed
        // ticks are replayed in between.
        tokio::time::sleep(Duration::from_secs(26)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}

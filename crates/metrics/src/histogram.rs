//! Cycle-duration histogram
//!
//! Fixed buckets sized for cycles that normally complete well under their
//! 60s cadence. Observations are lock-free.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bounds (seconds) of the histogram buckets.
pub const BUCKET_BOUNDS: [f64; 6] = [0.1, 0.5, 1.0, 2.5, 5.0, 10.0];

/// A fixed-bucket duration histogram.
///
/// Bucket counts are non-cumulative internally; the Prometheus exposition
/// accumulates them into the conventional `le` series.
#[derive(Debug, Default)]
pub struct CycleHistogram {
    buckets: [AtomicU64; 6],
    count: AtomicU64,
    /// Sum of observed durations in microseconds
    sum_micros: AtomicU64,
}

impl CycleHistogram {
    pub const fn new() -> Self {
        Self {
            buckets: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            count: AtomicU64::new(0),
            sum_micros: AtomicU64::new(0),
        }
    }

    /// Record one cycle duration.
    pub fn observe(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        for (i, bound) in BUCKET_BOUNDS.iter().enumerate() {
            if secs <= *bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                break;
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Total number of observations.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of observations in seconds.
    pub fn sum_seconds(&self) -> f64 {
        self.sum_micros.load(Ordering::Relaxed) as f64 / 1e6
    }

    /// Cumulative count at or below each bucket bound.
    pub fn cumulative(&self) -> [u64; 6] {
        let mut out = [0u64; 6];
        let mut running = 0;
        for (i, bucket) in self.buckets.iter().enumerate() {
            running += bucket.load(Ordering::Relaxed);
            out[i] = running;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_buckets() {
        let h = CycleHistogram::new();
        h.observe(Duration::from_millis(50)); // <= 0.1
        h.observe(Duration::from_millis(300)); // <= 0.5
        h.observe(Duration::from_secs(2)); // <= 2.5
        h.observe(Duration::from_secs(30)); // above all bounds

        assert_eq!(h.count(), 4);
        assert_eq!(h.cumulative(), [1, 2, 2, 3, 3, 3]);
        assert!((h.sum_seconds() - 32.35).abs() < 1e-6);
    }

    #[test]
    fn test_cumulative_is_monotonic() {
        let h = CycleHistogram::new();
        for ms in [10, 90, 400, 900, 2400, 4900, 9000] {
            h.observe(Duration::from_millis(ms));
        }
        let cumulative = h.cumulative();
        assert!(cumulative.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(cumulative[5], 7);
    }
}

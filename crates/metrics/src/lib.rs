//! CityFlow - Metrics
//!
//! Internal metrics collection for the pipeline stages.
//!
//! # Overview
//!
//! This crate provides:
//! - Atomic counters for per-stage message/record accounting
//! - A fixed-bucket histogram for cycle durations
//! - Prometheus text exposition served on the stage ops endpoint
//!
//! # Design Principles
//!
//! - **Lock-free**: all metrics use atomic operations
//! - **Low overhead**: no allocations during metric updates
//! - **Stable names**: the exposition preserves the established
//!   `cityflow_<stage>_<subject>_<event>_total` series names, so existing
//!   dashboards keep working
//!
//! # Example
//!
//! ```ignore
//! use cityflow_metrics::StageMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(StageMetrics::new("predictor", "predictions"));
//! metrics.generated.inc();
//! tokio::spawn(cityflow_metrics::serve_ops(addr, metrics.clone(), cancel));
//! ```

mod histogram;
mod ops;
mod stage;

pub use histogram::CycleHistogram;
pub use ops::{serve_ops, OpsError};
pub use stage::{StageMetrics, StageSnapshot};

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter wrapper for convenient metric operations
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Create a new counter initialized to 0
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increment the counter by `val` (relaxed ordering for performance)
    #[inline]
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Increment the counter by 1
    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    /// Get the current value (relaxed ordering)
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

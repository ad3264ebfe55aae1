//! Per-stage metric set

use std::fmt::Write as _;
use std::time::Duration;

use crate::histogram::BUCKET_BOUNDS;
use crate::{Counter, CycleHistogram};

/// Counters and cycle timing for one pipeline stage.
///
/// `subject` names the unit the stage accounts for (`messages`,
/// `predictions`, `reroutes`) and becomes part of the exported series
/// names, e.g. `cityflow_collector_messages_received_total`.
#[derive(Debug)]
pub struct StageMetrics {
    stage: &'static str,
    subject: &'static str,
    /// Bus deliveries accepted for processing (collector)
    pub received: Counter,
    /// Records computed this process lifetime (predictor, rerouter)
    pub generated: Counter,
    /// Records successfully written to the store
    pub stored: Counter,
    /// Records published on the live channel
    pub published: Counter,
    /// Units rejected or failed (validation, store, query errors)
    pub failed: Counter,
    /// Full-cycle wall time
    pub cycle_duration: CycleHistogram,
}

impl StageMetrics {
    pub const fn new(stage: &'static str, subject: &'static str) -> Self {
        Self {
            stage,
            subject,
            received: Counter::new(),
            generated: Counter::new(),
            stored: Counter::new(),
            published: Counter::new(),
            failed: Counter::new(),
            cycle_duration: CycleHistogram::new(),
        }
    }

    /// Record one cycle duration.
    pub fn observe_cycle(&self, elapsed: Duration) {
        self.cycle_duration.observe(elapsed);
    }

    /// Take a snapshot of current counter values.
    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            received: self.received.get(),
            generated: self.generated.get(),
            stored: self.stored.get(),
            published: self.published.get(),
            failed: self.failed.get(),
            cycles: self.cycle_duration.count(),
        }
    }

    /// Render the stage metrics in Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::with_capacity(1024);
        let stage = self.stage;
        let subject = self.subject;

        for (event, counter) in [
            ("received", &self.received),
            ("generated", &self.generated),
            ("stored", &self.stored),
            ("published", &self.published),
            ("failed", &self.failed),
        ] {
            let name = format!("cityflow_{stage}_{subject}_{event}_total");
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {}", counter.get());
        }

        let hist = format!("cityflow_{stage}_cycle_duration_seconds");
        let _ = writeln!(out, "# TYPE {hist} histogram");
        let cumulative = self.cycle_duration.cumulative();
        for (bound, count) in BUCKET_BOUNDS.iter().zip(cumulative) {
            let _ = writeln!(out, "{hist}_bucket{{le=\"{bound}\"}} {count}");
        }
        let _ = writeln!(
            out,
            "{hist}_bucket{{le=\"+Inf\"}} {}",
            self.cycle_duration.count()
        );
        let _ = writeln!(out, "{hist}_sum {}", self.cycle_duration.sum_seconds());
        let _ = writeln!(out, "{hist}_count {}", self.cycle_duration.count());

        out
    }
}

/// Point-in-time snapshot of stage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSnapshot {
    pub received: u64,
    pub generated: u64,
    pub stored: u64,
    pub published: u64,
    pub failed: u64,
    pub cycles: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let m = StageMetrics::new("collector", "messages");
        m.received.add(3);
        m.stored.add(2);
        m.failed.inc();

        let snap = m.snapshot();
        assert_eq!(snap.received, 3);
        assert_eq!(snap.stored, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.generated, 0);
    }

    #[test]
    fn test_prometheus_series_names() {
        let m = StageMetrics::new("predictor", "predictions");
        m.generated.add(7);
        m.observe_cycle(Duration::from_millis(200));

        let text = m.render_prometheus();
        assert!(text.contains("cityflow_predictor_predictions_generated_total 7"));
        assert!(text.contains("cityflow_predictor_cycle_duration_seconds_bucket{le=\"0.5\"} 1"));
        assert!(text.contains("cityflow_predictor_cycle_duration_seconds_count 1"));
    }
}

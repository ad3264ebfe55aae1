//! Reroute cycle
//!
//! Each cycle reads the latest forecast per road and, for every road above
//! the congestion threshold, recommends its least-congested alternative
//! when the improvement clears the deadband.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Timelike, Utc};
use tracing::{error, info, warn};

use cityflow_cache::Cache;
use cityflow_config::RerouterConfig;
use cityflow_metrics::StageMetrics;
use cityflow_storage::{PredictionStore, RerouteStore};
use cityflow_types::{channels, Reroute};

use crate::graph::AdjacencyGraph;

/// Minimum score improvement required to emit a recommendation.
///
/// The deadband prevents flapping when adjacent roads share congestion.
pub const MIN_IMPROVEMENT: f64 = 0.1;

/// ETA minutes gained per unit of score improvement.
const ETA_GAIN_PER_DELTA: f64 = 15.0;

/// Estimated CO2 gain per unit of score improvement.
const CO2_GAIN_PER_DELTA: f64 = 2.5;

/// Choose reroutes from the latest per-road scores.
///
/// Alternatives are scanned in adjacency-list order keeping only roads
/// with a known score; strict minimization means the first entry wins
/// ties. Emission order follows sorted road ids so repeated cycles over
/// the same scores are deterministic.
pub fn select_reroutes(
    now: DateTime<Utc>,
    scores: &HashMap<String, f64>,
    graph: &AdjacencyGraph,
    threshold: f64,
) -> Vec<Reroute> {
    let mut congested: Vec<(&String, f64)> = scores
        .iter()
        .filter(|(_, score)| **score > threshold)
        .map(|(road, score)| (road, *score))
        .collect();
    congested.sort_by(|a, b| a.0.cmp(b.0));

    let mut reroutes = Vec::new();
    for (road_id, score) in congested {
        let Some(alternatives) = graph.alternatives(road_id) else {
            continue;
        };

        let mut best: Option<(&str, f64)> = None;
        for alt in alternatives {
            let Some(alt_score) = scores.get(alt) else {
                continue;
            };
            if best.is_none_or(|(_, best_score)| *alt_score < best_score) {
                best = Some((alt, *alt_score));
            }
        }

        let Some((alt_id, alt_score)) = best else {
            continue;
        };

        let delta = score - alt_score;
        if delta < MIN_IMPROVEMENT {
            continue;
        }

        reroutes.push(Reroute {
            ts: now,
            route_id: road_id.clone(),
            alt_route_id: alt_id.to_string(),
            reason: format!(
                "high-congestion: {score:.2} on {road_id}, reroute to {alt_id} ({alt_score:.2})"
            ),
            estimated_co2_gain: Some(delta * CO2_GAIN_PER_DELTA),
            eta_gain_min: Some(delta * ETA_GAIN_PER_DELTA),
        });
    }

    reroutes
}

/// One rerouter stage instance.
pub struct RerouterCycle {
    predictions: PredictionStore,
    reroutes: RerouteStore,
    cache: Cache,
    graph: AdjacencyGraph,
    config: RerouterConfig,
    metrics: Arc<StageMetrics>,
}

impl RerouterCycle {
    pub fn new(
        predictions: PredictionStore,
        reroutes: RerouteStore,
        cache: Cache,
        graph: AdjacencyGraph,
        config: RerouterConfig,
        metrics: Arc<StageMetrics>,
    ) -> Self {
        Self {
            predictions,
            reroutes,
            cache,
            graph,
            config,
            metrics,
        }
    }

    /// Run one cycle; failures are counted, never propagated.
    pub async fn run(&self) {
        let start = Instant::now();
        self.run_inner(start).await;
        self.metrics.observe_cycle(start.elapsed());
    }

    async fn run_inner(&self, start: Instant) {
        let now = Utc::now();
        let now = now.with_nanosecond(0).unwrap_or(now);

        let latest = match self.predictions.latest_scores().await {
            Ok(latest) => latest,
            Err(err) => {
                self.metrics.failed.inc();
                error!(error = %err, "query predictions failed");
                return;
            }
        };
        self.metrics.failed.add(latest.skipped_rows);

        if latest.scores.is_empty() {
            info!("no predictions available, skipping");
            return;
        }

        let reroutes = select_reroutes(now, &latest.scores, &self.graph, self.config.threshold);
        self.metrics.generated.add(reroutes.len() as u64);

        if reroutes.is_empty() {
            info!(
                threshold = self.config.threshold,
                roads = latest.scores.len(),
                "no congested roads above threshold"
            );
            return;
        }

        let mut stored = 0;
        for reroute in &reroutes {
            match self.reroutes.upsert(reroute).await {
                Ok(()) => {
                    self.metrics.stored.inc();
                    stored += 1;
                }
                Err(err) => {
                    self.metrics.failed.inc();
                    error!(route_id = %reroute.route_id, error = %err, "db upsert failed");
                }
            }
        }

        let mut published = 0;
        for reroute in &reroutes {
            match self.cache.publish_json(channels::REROUTES, reroute).await {
                Ok(()) => {
                    self.metrics.published.inc();
                    published += 1;
                }
                Err(err) => {
                    warn!(route_id = %reroute.route_id, error = %err, "publish failed");
                }
            }
        }

        info!(
            recommendations = reroutes.len(),
            stored,
            published,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "reroute cycle completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scores(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(road, score)| (road.to_string(), *score))
            .collect()
    }

    fn cycle_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_congested_road_gets_best_alternative() {
        let graph = AdjacencyGraph::city_default();
        let scores = scores(&[
            ("RING-NORTH-12", 0.8),
            ("RING-SOUTH-09", 0.3),
            ("CITY-CENTER-01", 0.4),
        ]);

        let reroutes = select_reroutes(cycle_ts(), &scores, &graph, 0.5);
        assert_eq!(reroutes.len(), 1);

        let reroute = &reroutes[0];
        assert_eq!(reroute.route_id, "RING-NORTH-12");
        assert_eq!(reroute.alt_route_id, "RING-SOUTH-09");
        assert_eq!(reroute.eta_gain_min, Some(7.5));
        assert_eq!(reroute.estimated_co2_gain, Some(1.25));
        assert!(reroute.reason.contains("0.80"));
        assert!(reroute.reason.contains("0.30"));
        assert_eq!(reroute.ts, cycle_ts());
    }

    #[test]
    fn test_deadband_suppresses_marginal_improvement() {
        let graph = AdjacencyGraph::city_default();
        let scores = scores(&[
            ("RING-NORTH-12", 0.80),
            ("RING-SOUTH-09", 0.75),
            ("CITY-CENTER-01", 0.78),
        ]);

        // Best alternative improves by only 0.05.
        let reroutes = select_reroutes(cycle_ts(), &scores, &graph, 0.5);
        assert!(reroutes.is_empty());
    }

    #[test]
    fn test_roads_at_threshold_not_congested() {
        let graph = AdjacencyGraph::city_default();
        let scores = scores(&[("RING-NORTH-12", 0.5), ("RING-SOUTH-09", 0.1)]);
        assert!(select_reroutes(cycle_ts(), &scores, &graph, 0.5).is_empty());
    }

    #[test]
    fn test_unknown_road_skipped() {
        let graph = AdjacencyGraph::city_default();
        let scores = scores(&[("OFF-GRID-ROAD", 0.9), ("RING-SOUTH-09", 0.1)]);
        assert!(select_reroutes(cycle_ts(), &scores, &graph, 0.5).is_empty());
    }

    #[test]
    fn test_alternatives_without_scores_skipped() {
        let graph = AdjacencyGraph::city_default();
        // Congested road whose alternatives have no forecasts at all.
        let scores = scores(&[("AIRPORT-AXIS-03", 0.9)]);
        assert!(select_reroutes(cycle_ts(), &scores, &graph, 0.5).is_empty());
    }

    #[test]
    fn test_tie_breaks_on_list_order() {
        let graph = AdjacencyGraph::city_default();
        let scores = scores(&[
            ("RING-NORTH-12", 0.9),
            ("RING-SOUTH-09", 0.2),
            ("CITY-CENTER-01", 0.2),
        ]);

        let reroutes = select_reroutes(cycle_ts(), &scores, &graph, 0.5);
        assert_eq!(reroutes.len(), 1);
        // RING-SOUTH-09 appears first in RING-NORTH-12's adjacency list.
        assert_eq!(reroutes[0].alt_route_id, "RING-SOUTH-09");
    }

    #[test]
    fn test_gating_invariants_hold_for_all_emitted() {
        let graph = AdjacencyGraph::city_default();
        let scores = scores(&[
            ("RING-NORTH-12", 0.95),
            ("RING-SOUTH-09", 0.7),
            ("CITY-CENTER-01", 0.2),
            ("AIRPORT-AXIS-03", 0.85),
            ("UNIVERSITY-LOOP-07", 0.4),
        ]);
        let threshold = 0.5;

        let reroutes = select_reroutes(cycle_ts(), &scores, &graph, threshold);
        assert!(!reroutes.is_empty());
        for reroute in &reroutes {
            let score = scores[&reroute.route_id];
            let alt_score = scores[&reroute.alt_route_id];
            assert!(score > threshold);
            assert!(alt_score <= score - MIN_IMPROVEMENT);
            assert_ne!(reroute.route_id, reroute.alt_route_id);
            assert!(graph
                .alternatives(&reroute.route_id)
                .unwrap()
                .contains(&reroute.alt_route_id));
        }
    }
}

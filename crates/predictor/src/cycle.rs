//! Prediction cycle
//!
//! Each cycle aggregates the lookback window into 5-minute buckets per
//! road, forecasts every observed road, and upserts + publishes the
//! results stamped with the cycle start time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Timelike, Utc};
use tracing::{error, info, warn};

use cityflow_cache::Cache;
use cityflow_config::PredictorConfig;
use cityflow_metrics::StageMetrics;
use cityflow_storage::{PredictionStore, TrafficStore};
use cityflow_types::{channels, Prediction};

use crate::forecast::{forecast_road, BucketPoint};

/// One predictor stage instance.
pub struct PredictorCycle {
    traffic: TrafficStore,
    predictions: PredictionStore,
    cache: Cache,
    config: PredictorConfig,
    metrics: Arc<StageMetrics>,
}

impl PredictorCycle {
    pub fn new(
        traffic: TrafficStore,
        predictions: PredictionStore,
        cache: Cache,
        config: PredictorConfig,
        metrics: Arc<StageMetrics>,
    ) -> Self {
        Self {
            traffic,
            predictions,
            cache,
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
        let window_start = now - ChronoDuration::minutes(self.config.lookback_min);

        let scan = match self.traffic.bucketed_since(window_start).await {
            Ok(scan) => scan,
            Err(err) => {
                self.metrics.failed.inc();
                error!(error = %err, "query traffic_raw failed");
                return;
            }
        };
        self.metrics.failed.add(scan.skipped_rows);

        // Group buckets by road, tracking the raw sample count that feeds
        // the confidence estimate.
        let mut road_buckets: HashMap<String, Vec<BucketPoint>> = HashMap::new();
        let mut total_samples: HashMap<String, i64> = HashMap::new();
        for bucket in &scan.buckets {
            let offset_min = (bucket.bucket - window_start).num_seconds() as f64 / 60.0;
            road_buckets
                .entry(bucket.road_id.clone())
                .or_default()
                .push(BucketPoint {
                    offset_min,
                    avg_speed: bucket.avg_speed,
                    avg_occupancy: bucket.avg_occupancy,
                    avg_flow: bucket.avg_flow,
                });
            *total_samples.entry(bucket.road_id.clone()).or_default() += bucket.samples;
        }

        if road_buckets.is_empty() {
            info!("no traffic data in lookback window, skipping");
            return;
        }

        let hour = now.hour();
        let mut predictions = Vec::with_capacity(road_buckets.len());
        for (road_id, buckets) in road_buckets {
            let samples = total_samples.get(&road_id).copied().unwrap_or(0);
            let Some(forecast) = forecast_road(
                &buckets,
                samples,
                self.config.lookback_min,
                self.config.horizon_min,
                hour,
            ) else {
                continue;
            };

            predictions.push(Prediction {
                ts: now,
                road_id,
                horizon_min: self.config.horizon_min,
                congestion_score: forecast.congestion_score,
                confidence: forecast.confidence,
                model_version: self.config.model_version.clone(),
            });
            self.metrics.generated.inc();
        }

        if predictions.is_empty() {
            info!("no predictions generated");
            return;
        }

        let mut stored = 0;
        for prediction in &predictions {
            match self.predictions.upsert(prediction).await {
                Ok(()) => {
                    self.metrics.stored.inc();
                    stored += 1;
                }
                Err(err) => {
                    self.metrics.failed.inc();
                    error!(road_id = %prediction.road_id, error = %err, "db upsert failed");
                }
            }
        }

        let mut published = 0;
        for prediction in &predictions {
            match self.cache.publish_json(channels::PREDICTIONS, prediction).await {
                Ok(()) => {
                    self.metrics.published.inc();
                    published += 1;
                }
                Err(err) => {
                    warn!(road_id = %prediction.road_id, error = %err, "publish failed");
                }
            }
        }

        info!(
            model = %self.config.model_version,
            roads = predictions.len(),
            stored,
            published,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "prediction cycle completed"
        );
    }
}

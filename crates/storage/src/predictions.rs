//! Forecast store

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::warn;

use cityflow_types::Prediction;

use crate::StorageResult;

/// Store for the `predictions` table.
#[derive(Clone)]
pub struct PredictionStore {
    pool: PgPool,
}

/// Latest congestion score per road.
#[derive(Debug, Default)]
pub struct LatestScores {
    pub scores: HashMap<String, f64>,
    pub skipped_rows: u64,
}

impl PredictionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite a forecast keyed by `(ts, road_id, horizon_min)`.
    pub async fn upsert(&self, prediction: &Prediction) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO predictions (ts, road_id, horizon_min, congestion_score, confidence, model_version)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (ts, road_id, horizon_min) DO UPDATE SET
                congestion_score = EXCLUDED.congestion_score,
                confidence = EXCLUDED.confidence,
                model_version = EXCLUDED.model_version
            "#,
        )
        .bind(prediction.ts)
        .bind(&prediction.road_id)
        .bind(prediction.horizon_min)
        .bind(prediction.congestion_score)
        .bind(prediction.confidence)
        .bind(&prediction.model_version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent congestion score per road across all horizons.
    pub async fn latest_scores(&self) -> StorageResult<LatestScores> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (road_id) road_id, congestion_score
            FROM predictions
            ORDER BY road_id, ts DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut latest = LatestScores::default();
        for row in rows {
            let decoded: Result<(String, f64), sqlx::Error> = (|| {
                Ok((row.try_get("road_id")?, row.try_get("congestion_score")?))
            })();
            match decoded {
                Ok((road_id, score)) => {
                    latest.scores.insert(road_id, score);
                }
                Err(err) => {
                    warn!(error = %err, "skipping undecodable prediction row");
                    latest.skipped_rows += 1;
                }
            }
        }

        Ok(latest)
    }

    /// Forecast history for one horizon, newest first, with optional road
    /// filter and cursor.
    pub async fn recent(
        &self,
        road_id: Option<&str>,
        horizon_min: i32,
        before: Option<DateTime<Utc>>,
        fetch_limit: i64,
    ) -> StorageResult<Vec<Prediction>> {
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "SELECT ts, road_id, horizon_min, congestion_score, \
             COALESCE(confidence, 0) AS confidence, model_version \
             FROM predictions WHERE horizon_min = ",
        );
        query.push_bind(horizon_min);

        if let Some(before) = before {
            query.push(" AND ts < ").push_bind(before);
        }
        if let Some(road_id) = road_id {
            query.push(" AND road_id = ").push_bind(road_id);
        }
        query.push(" ORDER BY ts DESC LIMIT ").push_bind(fetch_limit);

        let rows = query.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(Prediction {
                    ts: row.try_get("ts")?,
                    road_id: row.try_get("road_id")?,
                    horizon_min: row.try_get("horizon_min")?,
                    congestion_score: row.try_get("congestion_score")?,
                    confidence: row.try_get("confidence")?,
                    model_version: row.try_get("model_version")?,
                })
            })
            .collect()
    }
}

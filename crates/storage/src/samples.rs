//! Raw traffic sample store

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::warn;

use cityflow_types::TrafficSample;

use crate::StorageResult;

/// Store for the `traffic_raw` time-series table.
#[derive(Clone)]
pub struct TrafficStore {
    pool: PgPool,
}

/// One 5-minute aggregation bucket for a road.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficBucket {
    pub bucket: DateTime<Utc>,
    pub road_id: String,
    pub avg_speed: f64,
    pub avg_occupancy: f64,
    pub avg_flow: f64,
    pub samples: i64,
}

/// Result of a bucket aggregation scan.
///
/// Rows that fail to decode are skipped and counted rather than aborting
/// the cycle.
#[derive(Debug, Default)]
pub struct BucketScan {
    pub buckets: Vec<TrafficBucket>,
    pub skipped_rows: u64,
}

impl TrafficStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a sample, silently dropping `(ts, sensor_id)` duplicates.
    pub async fn insert(&self, sample: &TrafficSample) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO traffic_raw (ts, sensor_id, road_id, speed_kmh, flow_rate, occupancy)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (ts, sensor_id) DO NOTHING
            "#,
        )
        .bind(sample.ts)
        .bind(&sample.sensor_id)
        .bind(&sample.road_id)
        .bind(sample.speed_kmh)
        .bind(sample.flow_rate)
        .bind(sample.occupancy)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Aggregate samples since `window_start` into 5-minute buckets per
    /// road, ordered by road then bucket.
    pub async fn bucketed_since(&self, window_start: DateTime<Utc>) -> StorageResult<BucketScan> {
        let rows = sqlx::query(
            r#"
            SELECT
                date_bin(INTERVAL '5 minutes', ts, TIMESTAMPTZ 'epoch') AS bucket,
                road_id,
                AVG(speed_kmh)  AS avg_speed,
                AVG(occupancy)  AS avg_occupancy,
                AVG(flow_rate)  AS avg_flow,
                COUNT(*)        AS samples
            FROM traffic_raw
            WHERE ts >= $1
            GROUP BY bucket, road_id
            ORDER BY road_id, bucket
            "#,
        )
        .bind(window_start)
        .fetch_all(&self.pool)
        .await?;

        let mut scan = BucketScan::default();
        for row in rows {
            match decode_bucket(&row) {
                Ok(bucket) => scan.buckets.push(bucket),
                Err(err) => {
                    warn!(error = %err, "skipping undecodable aggregation row");
                    scan.skipped_rows += 1;
                }
            }
        }

        Ok(scan)
    }

    /// Recent samples, newest first, with optional road filter and cursor.
    pub async fn recent(
        &self,
        road_id: Option<&str>,
        before: Option<DateTime<Utc>>,
        fetch_limit: i64,
    ) -> StorageResult<Vec<TrafficSample>> {
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "SELECT ts, sensor_id, road_id, speed_kmh, flow_rate, occupancy FROM traffic_raw",
        );

        let mut clause = " WHERE ";
        if let Some(before) = before {
            query.push(clause).push("ts < ").push_bind(before);
            clause = " AND ";
        }
        if let Some(road_id) = road_id {
            query.push(clause).push("road_id = ").push_bind(road_id);
        }
        query.push(" ORDER BY ts DESC LIMIT ").push_bind(fetch_limit);

        let rows = query.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(TrafficSample {
                    ts: row.try_get("ts")?,
                    sensor_id: row.try_get("sensor_id")?,
                    road_id: row.try_get("road_id")?,
                    speed_kmh: row.try_get("speed_kmh")?,
                    flow_rate: row.try_get("flow_rate")?,
                    occupancy: row.try_get("occupancy")?,
                })
            })
            .collect()
    }
}

fn decode_bucket(row: &sqlx::postgres::PgRow) -> Result<TrafficBucket, sqlx::Error> {
    Ok(TrafficBucket {
        bucket: row.try_get("bucket")?,
        road_id: row.try_get("road_id")?,
        avg_speed: row.try_get("avg_speed")?,
        avg_occupancy: row.try_get("avg_occupancy")?,
        avg_flow: row.try_get("avg_flow")?,
        samples: row.try_get("samples")?,
    })
}

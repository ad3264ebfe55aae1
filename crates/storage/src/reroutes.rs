//! Reroute store

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use cityflow_types::Reroute;

use crate::StorageResult;

/// Store for the `reroutes` table.
#[derive(Clone)]
pub struct RerouteStore {
    pool: PgPool,
}

impl RerouteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite a recommendation keyed by
    /// `(ts, route_id, alt_route_id)`.
    pub async fn upsert(&self, reroute: &Reroute) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reroutes (ts, route_id, alt_route_id, reason, estimated_co2_gain, eta_gain_min)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (ts, route_id, alt_route_id) DO UPDATE SET
                reason = EXCLUDED.reason,
                estimated_co2_gain = EXCLUDED.estimated_co2_gain,
                eta_gain_min = EXCLUDED.eta_gain_min
            "#,
        )
        .bind(reroute.ts)
        .bind(&reroute.route_id)
        .bind(&reroute.alt_route_id)
        .bind(&reroute.reason)
        .bind(reroute.estimated_co2_gain)
        .bind(reroute.eta_gain_min)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recommendation history, newest first, with optional route filter
    /// and cursor.
    pub async fn recent(
        &self,
        route_id: Option<&str>,
        before: Option<DateTime<Utc>>,
        fetch_limit: i64,
    ) -> StorageResult<Vec<Reroute>> {
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "SELECT ts, route_id, alt_route_id, reason, estimated_co2_gain, eta_gain_min \
             FROM reroutes",
        );

        let mut clause = " WHERE ";
        if let Some(before) = before {
            query.push(clause).push("ts < ").push_bind(before);
            clause = " AND ";
        }
        if let Some(route_id) = route_id {
            query.push(clause).push("route_id = ").push_bind(route_id);
        }
        query.push(" ORDER BY ts DESC LIMIT ").push_bind(fetch_limit);

        let rows = query.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(Reroute {
                    ts: row.try_get("ts")?,
                    route_id: row.try_get("route_id")?,
                    alt_route_id: row.try_get("alt_route_id")?,
                    reason: row.try_get("reason")?,
                    estimated_co2_gain: row.try_get("estimated_co2_gain")?,
                    eta_gain_min: row.try_get("eta_gain_min")?,
                })
            })
            .collect()
    }
}

//! Road registry store

use sqlx::{PgPool, Row};

use cityflow_types::Road;

use crate::StorageResult;

/// Store for the static `roads` reference table.
#[derive(Clone)]
pub struct RoadStore {
    pool: PgPool,
}

impl RoadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All registered roads ordered by id.
    pub async fn list(&self) -> StorageResult<Vec<Road>> {
        let rows = sqlx::query(
            "SELECT road_id, label, lat, lng, updated_at FROM roads ORDER BY road_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Road {
                    road_id: row.try_get("road_id")?,
                    label: row.try_get("label")?,
                    lat: row.try_get("lat")?,
                    lng: row.try_get("lng")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }
}

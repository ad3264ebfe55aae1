//! Schema initialization
//!
//! Every stage initializes the schema at startup; all statements are
//! idempotent, so concurrent stage boots are safe.

use sqlx::PgPool;

use crate::StorageResult;

/// Create tables and indexes if absent.
pub async fn initialize(pool: &PgPool) -> StorageResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS traffic_raw (
            ts         TIMESTAMPTZ NOT NULL,
            sensor_id  TEXT NOT NULL,
            road_id    TEXT NOT NULL,
            speed_kmh  DOUBLE PRECISION NOT NULL DEFAULT 0,
            flow_rate  DOUBLE PRECISION NOT NULL DEFAULT 0,
            occupancy  DOUBLE PRECISION NOT NULL DEFAULT 0,
            PRIMARY KEY (ts, sensor_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_traffic_raw_road_ts
            ON traffic_raw (road_id, ts DESC)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            ts               TIMESTAMPTZ NOT NULL,
            road_id          TEXT NOT NULL,
            horizon_min      INTEGER NOT NULL DEFAULT 30,
            congestion_score DOUBLE PRECISION NOT NULL,
            confidence       DOUBLE PRECISION,
            model_version    TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (ts, road_id, horizon_min)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reroutes (
            ts                 TIMESTAMPTZ NOT NULL,
            route_id           TEXT NOT NULL,
            alt_route_id       TEXT NOT NULL,
            reason             TEXT NOT NULL DEFAULT '',
            estimated_co2_gain DOUBLE PRECISION,
            eta_gain_min       DOUBLE PRECISION,
            PRIMARY KEY (ts, route_id, alt_route_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS roads (
            road_id    TEXT PRIMARY KEY,
            label      TEXT NOT NULL DEFAULT '',
            lat        DOUBLE PRECISION,
            lng        DOUBLE PRECISION,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            UUID PRIMARY KEY,
            email         VARCHAR(255) UNIQUE NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            role          VARCHAR(32) NOT NULL DEFAULT 'user',
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

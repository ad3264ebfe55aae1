//! CityFlow - Storage
//!
//! Postgres access for every stage: the raw sample table, forecast and
//! reroute tables, the road registry, and user accounts.
//!
//! # Design
//!
//! - One store struct per table, each holding a cheap pool clone
//! - All cross-stage atomicity comes from `INSERT ... ON CONFLICT`; there
//!   is no other shared mutable state in the pipeline
//! - Background stages run small pools; the API runs a larger one

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod error;
mod predictions;
mod reroutes;
mod roads;
mod samples;
mod schema;
mod users;

pub use error::{StorageError, StorageResult};
pub use predictions::{LatestScores, PredictionStore};
pub use reroutes::RerouteStore;
pub use roads::RoadStore;
pub use samples::{BucketScan, TrafficBucket, TrafficStore};
pub use schema::initialize;
pub use users::{UserRecord, UserStore};

/// Connection pool sizing.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
}

impl PoolSettings {
    /// Sizing for the query API (25 open / 10 idle / 5 min lifetime).
    pub fn api() -> Self {
        Self {
            max_connections: 25,
            min_connections: 10,
            max_lifetime: Duration::from_secs(300),
        }
    }

    /// Sizing for background stages, which hold few concurrent queries.
    pub fn stage() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            max_lifetime: Duration::from_secs(300),
        }
    }
}

/// Open a pool and verify connectivity with a ping.
pub async fn connect(dsn: &str, settings: PoolSettings) -> StorageResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .max_lifetime(settings.max_lifetime)
        .connect(dsn)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Open a pool without connecting.
///
/// Connections are established on first use; used by tests that exercise
/// request paths which never reach the database.
pub fn connect_lazy(dsn: &str, settings: PoolSettings) -> StorageResult<PgPool> {
    Ok(PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .max_lifetime(settings.max_lifetime)
        .connect_lazy(dsn)?)
}

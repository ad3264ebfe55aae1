//! Application state
//!
//! Shared state for API handlers: the per-table stores, the cache handle,
//! the token service, and the process cancellation token that bounds
//! background cache population.

use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cityflow_auth::TokenService;
use cityflow_cache::Cache;
use cityflow_storage::{PredictionStore, RerouteStore, RoadStore, TrafficStore, UserStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub traffic: TrafficStore,
    pub predictions: PredictionStore,
    pub reroutes: RerouteStore,
    pub roads: RoadStore,
    pub users: UserStore,
    pub cache: Cache,
    pub tokens: TokenService,
    /// Process shutdown token; background cache writes stop with it
    pub cancel: CancellationToken,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        cache: Cache,
        tokens: TokenService,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            traffic: TrafficStore::new(pool.clone()),
            predictions: PredictionStore::new(pool.clone()),
            reroutes: RerouteStore::new(pool.clone()),
            roads: RoadStore::new(pool.clone()),
            users: UserStore::new(pool),
            cache,
            tokens,
            cancel,
        }
    }

    /// Populate the cache after the response is served.
    ///
    /// Fire-and-forget, bounded by process shutdown so the write never
    /// outlives a clean exit. Duplicate populates are harmless: the query
    /// is idempotent and the TTL deterministic.
    pub fn cache_later<T>(&self, key: String, value: &T, ttl: Duration)
    where
        T: Serialize,
    {
        let Ok(payload) = serde_json::to_value(value) else {
            return;
        };
        let cache = self.cache.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = cache.set(&key, &payload, ttl) => {
                    if let Err(err) = result {
                        debug!(key = %key, error = %err, "cache populate failed");
                    }
                }
            }
        });
    }
}

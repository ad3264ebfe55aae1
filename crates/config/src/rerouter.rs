//! Rerouter stage configuration

use std::time::Duration;

use crate::{get_env_f64, get_env_u64, lookup_env, Result};

/// Reroute cycle settings.
#[derive(Debug, Clone)]
pub struct RerouterConfig {
    /// Cycle cadence (`REROUTE_INTERVAL_SEC`, default 60)
    pub interval: Duration,
    /// Minimum forecast score that marks a road congested
    /// (`CONGESTION_THRESHOLD`, default 0.5)
    pub threshold: f64,
    /// Optional JSON adjacency map overriding the built-in graph
    /// (`ADJACENCY_FILE`)
    pub adjacency_file: Option<String>,
}

impl RerouterConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            interval: Duration::from_secs(get_env_u64(&lookup_env, "REROUTE_INTERVAL_SEC", 60)?),
            threshold: get_env_f64(&lookup_env, "CONGESTION_THRESHOLD", 0.5)?,
            adjacency_file: lookup_env("ADJACENCY_FILE"),
        })
    }
}

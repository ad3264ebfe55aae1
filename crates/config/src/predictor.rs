//! Predictor stage configuration

use std::time::Duration;

use crate::{get_env, get_env_i64, get_env_u64, lookup_env, Result};

/// Forecast cycle settings.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Cycle cadence (`PREDICTION_INTERVAL_SEC`, default 60)
    pub interval: Duration,
    /// Lookback window in minutes (`LOOKBACK_WINDOW_MIN`, default 30)
    pub lookback_min: i64,
    /// Forecast horizon in minutes (`HORIZON_MIN`, default 30)
    pub horizon_min: i32,
    /// Tag written on every prediction (`MODEL_VERSION`)
    pub model_version: String,
}

impl PredictorConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            interval: Duration::from_secs(get_env_u64(&lookup_env, "PREDICTION_INTERVAL_SEC", 60)?),
            lookback_min: get_env_i64(&lookup_env, "LOOKBACK_WINDOW_MIN", 30)?,
            horizon_min: get_env_i64(&lookup_env, "HORIZON_MIN", 30)? as i32,
            model_version: get_env(&lookup_env, "MODEL_VERSION", "ewma-lr-v2"),
        })
    }
}

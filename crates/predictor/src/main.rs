//! Predictor - congestion forecast stage
//!
//! On a fixed cadence, aggregates recent raw samples into 5-minute buckets
//! per road, fits a trend, extrapolates to the forecast horizon, and
//! writes one scored prediction per observed road.
//!
//! Settings come from the environment (`DB_DSN`, `REDIS_URL`,
//! `PREDICTION_INTERVAL_SEC`, `LOOKBACK_WINDOW_MIN`, `HORIZON_MIN`,
//! `MODEL_VERSION`, `METRICS_ADDR`).

mod cycle;
mod forecast;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cityflow_cache::Cache;
use cityflow_config::{DatabaseConfig, MetricsConfig, PredictorConfig, RedisConfig};
use cityflow_metrics::{serve_ops, StageMetrics};
use cityflow_runtime::{shutdown_token, CycleScheduler};
use cityflow_storage::{PoolSettings, PredictionStore, TrafficStore};

use crate::cycle::PredictorCycle;

/// Predictor - congestion forecast stage
#[derive(Parser, Debug)]
#[command(name = "predictor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let db = DatabaseConfig::from_env().context("database config")?;
    let redis = RedisConfig::from_env().context("redis config")?;
    let config = PredictorConfig::from_env().context("predictor config")?;
    let metrics_cfg = MetricsConfig::from_env();

    let cancel = shutdown_token();
    let metrics = Arc::new(StageMetrics::new("predictor", "predictions"));

    let pool = cityflow_storage::connect(db.dsn(), PoolSettings::stage())
        .await
        .context("database connection failed")?;
    cityflow_storage::initialize(&pool)
        .await
        .context("schema initialization failed")?;
    info!("db connected");

    // The forecast channel is not optional for this stage.
    let cache = Cache::connect_required(redis.url())
        .await
        .context("redis connection failed")?;

    let ops = tokio::spawn(serve_ops(
        metrics_cfg.addr.clone(),
        metrics.clone(),
        cancel.clone(),
    ));

    info!(
        interval_secs = config.interval.as_secs(),
        lookback_min = config.lookback_min,
        horizon_min = config.horizon_min,
        model = %config.model_version,
        "predictor running"
    );

    let scheduler = CycleScheduler::new(config.interval);
    let cycle = Arc::new(PredictorCycle::new(
        TrafficStore::new(pool.clone()),
        PredictionStore::new(pool.clone()),
        cache,
        config,
        metrics.clone(),
    ));

    scheduler
        .run(cancel.clone(), move || {
            let cycle = cycle.clone();
            async move { cycle.run().await }
        })
        .await;

    info!("predictor shutting down");
    pool.close().await;
    if let Ok(Err(err)) = ops.await {
        error!(error = %err, "ops server error");
    }

    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

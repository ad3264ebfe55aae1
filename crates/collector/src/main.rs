//! Collector - traffic telemetry ingest stage
//!
//! Subscribes to the sensor topic on the MQTT bus, validates and persists
//! each sample, and mirrors the raw payload onto the live channel.
//!
//! # Usage
//!
//! ```bash
//! collector
//! collector --log-level debug
//! ```
//!
//! All operational settings come from the environment (`MQTT_URL`,
//! `MQTT_TOPIC`, `DB_DSN`, `REDIS_URL`, `METRICS_ADDR`).

mod ingest;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cityflow_cache::Cache;
use cityflow_config::{DatabaseConfig, MetricsConfig, MqttConfig, RedisConfig};
use cityflow_metrics::{serve_ops, StageMetrics};
use cityflow_runtime::shutdown_token;
use cityflow_storage::{PoolSettings, TrafficStore};

use crate::ingest::MqttIngest;

/// Collector - traffic telemetry ingest stage
#[derive(Parser, Debug)]
#[command(name = "collector")]
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
    let mqtt = MqttConfig::from_env().context("mqtt config")?;
    let metrics_cfg = MetricsConfig::from_env();

    let cancel = shutdown_token();
    let metrics = Arc::new(StageMetrics::new("collector", "messages"));

    let pool = cityflow_storage::connect(db.dsn(), PoolSettings::stage())
        .await
        .context("database connection failed")?;
    cityflow_storage::initialize(&pool)
        .await
        .context("schema initialization failed")?;
    info!("db connected");

    // The collector tolerates a missing cache: storage still works, only
    // the live mirror goes dark.
    let cache = Cache::connect(redis.url()).await;

    let ops = tokio::spawn(serve_ops(
        metrics_cfg.addr.clone(),
        metrics.clone(),
        cancel.clone(),
    ));

    let ingest = MqttIngest::new(
        mqtt,
        TrafficStore::new(pool.clone()),
        cache,
        metrics.clone(),
    )
    .context("mqtt config invalid")?;

    info!("collector running");
    ingest.run(cancel.clone()).await;

    info!("collector shutting down");
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

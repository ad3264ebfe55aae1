//! Rerouter - recommendation stage
//!
//! On a fixed cadence, reads the latest forecast per road and emits a
//! reroute recommendation for every congested road with a materially less
//! congested neighbour.
//!
//! Settings come from the environment (`DB_DSN`, `REDIS_URL`,
//! `REROUTE_INTERVAL_SEC`, `CONGESTION_THRESHOLD`, `ADJACENCY_FILE`,
//! `METRICS_ADDR`).

mod cycle;
mod graph;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cityflow_cache::Cache;
use cityflow_config::{DatabaseConfig, MetricsConfig, RedisConfig, RerouterConfig};
use cityflow_metrics::{serve_ops, StageMetrics};
use cityflow_runtime::{shutdown_token, CycleScheduler};
use cityflow_storage::{PoolSettings, PredictionStore, RerouteStore};

use crate::cycle::RerouterCycle;
use crate::graph::AdjacencyGraph;

/// Rerouter - recommendation stage
#[derive(Parser, Debug)]
#[command(name = "rerouter")]
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
    let config = RerouterConfig::from_env().context("rerouter config")?;
    let metrics_cfg = MetricsConfig::from_env();

    let graph = match &config.adjacency_file {
        Some(path) => {
            AdjacencyGraph::from_file(Path::new(path)).context("adjacency graph load failed")?
        }
        None => AdjacencyGraph::city_default(),
    };

    let cancel = shutdown_token();
    let metrics = Arc::new(StageMetrics::new("rerouter", "reroutes"));

    let pool = cityflow_storage::connect(db.dsn(), PoolSettings::stage())
        .await
        .context("database connection failed")?;
    cityflow_storage::initialize(&pool)
        .await
        .context("schema initialization failed")?;
    info!("db connected");

    // The recommendation channel is not optional for this stage.
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
        threshold = config.threshold,
        roads = graph.len(),
        "rerouter running"
    );

    let scheduler = CycleScheduler::new(config.interval);
    let cycle = Arc::new(RerouterCycle::new(
        PredictionStore::new(pool.clone()),
        RerouteStore::new(pool.clone()),
        cache,
        graph,
        config,
        metrics.clone(),
    ));

    scheduler
        .run(cancel.clone(), move || {
            let cycle = cycle.clone();
            async move { cycle.run().await }
        })
        .await;

    info!("rerouter shutting down");
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

//! CityFlow query API server
//!
//! Serves authenticated reads over the pipeline's output tables and the
//! live WebSocket bridge.
//!
//! # Usage
//!
//! ```bash
//! cityflow-api
//! cityflow-api --log-level debug
//! ```
//!
//! Settings come from the environment (`SERVER_PORT`, `DB_*`,
//! `JWT_SECRET`, `JWT_EXPIRY_HOURS`, `REDIS_*`, `CORS_ALLOWED_ORIGINS`).

use anyhow::{Context, Result};
use axum::extract::Request;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cityflow_api::cors::cors_layer;
use cityflow_api::{build_router, AppState};
use cityflow_auth::TokenService;
use cityflow_cache::Cache;
use cityflow_config::{CorsConfig, DatabaseConfig, JwtConfig, RedisConfig, ServerConfig};
use cityflow_runtime::shutdown_token;
use cityflow_storage::PoolSettings;

/// CityFlow query API server
#[derive(Parser, Debug)]
#[command(name = "cityflow-api")]
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

    let server = ServerConfig::from_env().context("server config")?;
    let db = DatabaseConfig::from_env().context("database config")?;
    let jwt = JwtConfig::from_env().context("jwt config")?;
    let redis = RedisConfig::from_env().context("redis config")?;
    let cors = CorsConfig::from_env();

    let cancel = shutdown_token();

    let pool = cityflow_storage::connect(db.dsn(), PoolSettings::api())
        .await
        .context("database connection failed")?;
    cityflow_storage::initialize(&pool)
        .await
        .context("schema initialization failed")?;
    info!("db connected");

    // The API tolerates a missing cache: reads fall through to the store
    // and the WebSocket bridge rejects upgrades until Redis returns.
    let cache = Cache::connect(redis.url()).await;

    let tokens = TokenService::new(jwt.secret.as_bytes(), jwt.expiry_hours);
    let state = AppState::new(pool.clone(), cache, tokens, cancel.clone());

    // Spans record the path only: the WebSocket token travels in the query
    // string and must never end up in logs.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = request.uri().path(),
        )
    });

    let app = build_router(state).layer(trace).layer(cors_layer(&cors));

    let addr = server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .context("failed to bind API server")?;

    info!(addr = %addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown({
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
            }
        })
        .await
        .context("API server error")?;

    info!("API server shutting down");
    pool.close().await;

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

//! CityFlow API
//!
//! HTTP API for querying pipeline output and streaming live traffic.
//!
//! # Overview
//!
//! Built on Axum. Historical reads go through a Redis read-through cache
//! in front of Postgres and are cursor-paginated descending by timestamp;
//! authenticated clients can upgrade to a WebSocket fed from the live
//! fan-out channel.
//!
//! # Endpoints
//!
//! - `GET /health` - liveness (no auth)
//! - `POST /api/auth/register` - create account, returns token + user
//! - `POST /api/auth/login` - verify credentials, returns token + user
//! - `POST /api/auth/logout` - acknowledgment (token required)
//! - `GET /api/roads` - cached road registry
//! - `GET /api/traffic/live?road_id&limit&before` - recent samples
//! - `GET /api/predictions?road_id&horizon&limit&before` - forecasts
//! - `GET /api/reroutes/recommended?route_id&limit&before` - reroutes
//! - `GET /ws/live?token` - WebSocket upgrade, forwards the live channel

pub mod cors;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::AppState;

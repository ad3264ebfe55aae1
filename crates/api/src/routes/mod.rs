//! API routes
//!
//! Route handlers grouped by resource. Authentication is enforced by the
//! [`AuthUser`](crate::extract::AuthUser) extractor on protected handlers
//! rather than by middleware.

pub mod auth;
pub mod predictions;
pub mod reroutes;
pub mod roads;
pub mod traffic;
pub mod ws;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Build the complete API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/roads", get(roads::list))
        .route("/api/traffic/live", get(traffic::live))
        .route("/api/predictions", get(predictions::list))
        .route("/api/reroutes/recommended", get(reroutes::recommended))
        .route("/ws/live", get(ws::live))
        .with_state(state)
}

/// Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

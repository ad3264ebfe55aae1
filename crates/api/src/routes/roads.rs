//! Road registry route

use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use cityflow_types::Road;

use crate::error::Result;
use crate::extract::AuthUser;
use crate::state::AppState;

const CACHE_KEY: &str = "roads:all";
const CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize, Deserialize)]
pub struct RoadsResponse {
    pub data: Vec<Road>,
}

/// GET /api/roads
pub async fn list(State(state): State<AppState>, _user: AuthUser) -> Result<Json<RoadsResponse>> {
    if let Some(cached) = state.cache.get::<RoadsResponse>(CACHE_KEY).await {
        return Ok(Json(cached));
    }

    let roads = state.roads.list().await?;
    let response = RoadsResponse { data: roads };

    state.cache_later(CACHE_KEY.to_string(), &response, CACHE_TTL);

    Ok(Json(response))
}

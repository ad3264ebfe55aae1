//! Live traffic history route

use std::time::Duration;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use cityflow_types::TrafficSample;

use crate::error::Result;
use crate::extract::AuthUser;
use crate::pagination::{format_cursor, paginate, CursorPage, Pagination};
use crate::state::AppState;

const CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct LiveParams {
    pub road_id: Option<String>,
    pub limit: Option<String>,
    pub before: Option<String>,
}

/// GET /api/traffic/live
pub async fn live(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<LiveParams>,
) -> Result<Json<CursorPage<TrafficSample>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.before.as_deref());
    let road_id = params.road_id.unwrap_or_default();

    // The key uses the parsed cursor, so an unusable `before` value hits
    // the same cache entry as no cursor at all.
    let before_key = page.before.map(format_cursor).unwrap_or_default();
    let cache_key = format!("traffic:live:{road_id}:{}:{before_key}", page.limit);

    if let Some(cached) = state.cache.get::<CursorPage<TrafficSample>>(&cache_key).await {
        return Ok(Json(cached));
    }

    let road_filter = (!road_id.is_empty()).then_some(road_id.as_str());
    let rows = state
        .traffic
        .recent(road_filter, page.before, page.fetch_limit())
        .await?;

    let response = paginate(rows, page.limit, |sample| sample.ts);
    state.cache_later(cache_key, &response, CACHE_TTL);

    Ok(Json(response))
}

//! Reroute history route

use std::time::Duration;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use cityflow_types::Reroute;

use crate::error::Result;
use crate::extract::AuthUser;
use crate::pagination::{format_cursor, paginate, CursorPage, Pagination};
use crate::state::AppState;

const CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct RerouteParams {
    pub route_id: Option<String>,
    pub limit: Option<String>,
    pub before: Option<String>,
}

/// GET /api/reroutes/recommended
pub async fn recommended(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<RerouteParams>,
) -> Result<Json<CursorPage<Reroute>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.before.as_deref());
    let route_id = params.route_id.unwrap_or_default();

    let before_key = page.before.map(format_cursor).unwrap_or_default();
    let cache_key = format!("reroutes:{route_id}:{}:{before_key}", page.limit);

    if let Some(cached) = state.cache.get::<CursorPage<Reroute>>(&cache_key).await {
        return Ok(Json(cached));
    }

    let route_filter = (!route_id.is_empty()).then_some(route_id.as_str());
    let rows = state
        .reroutes
        .recent(route_filter, page.before, page.fetch_limit())
        .await?;

    let response = paginate(rows, page.limit, |reroute| reroute.ts);
    state.cache_later(cache_key, &response, CACHE_TTL);

    Ok(Json(response))
}

//! Forecast history route

use std::time::Duration;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use cityflow_types::Prediction;

use crate::error::{ApiError, Result};
use crate::extract::AuthUser;
use crate::pagination::{format_cursor, paginate, CursorPage, Pagination};
use crate::state::AppState;

const CACHE_TTL: Duration = Duration::from_secs(30);

/// Default forecast horizon when the parameter is absent.
const DEFAULT_HORIZON_MIN: i32 = 30;

#[derive(Debug, Deserialize)]
pub struct PredictionParams {
    pub road_id: Option<String>,
    pub horizon: Option<String>,
    pub limit: Option<String>,
    pub before: Option<String>,
}

/// GET /api/predictions
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PredictionParams>,
) -> Result<Json<CursorPage<Prediction>>> {
    let horizon = match params.horizon.as_deref() {
        None => DEFAULT_HORIZON_MIN,
        Some(raw) => raw.parse::<i32>().ok().filter(|h| *h > 0).ok_or_else(|| {
            ApiError::BadRequest("invalid horizon parameter, must be a positive integer".into())
        })?,
    };

    let page = Pagination::parse(params.limit.as_deref(), params.before.as_deref());
    let road_id = params.road_id.unwrap_or_default();

    let before_key = page.before.map(format_cursor).unwrap_or_default();
    let cache_key = format!("predictions:{road_id}:{horizon}:{}:{before_key}", page.limit);

    if let Some(cached) = state.cache.get::<CursorPage<Prediction>>(&cache_key).await {
        return Ok(Json(cached));
    }

    let road_filter = (!road_id.is_empty()).then_some(road_id.as_str());
    let rows = state
        .predictions
        .recent(road_filter, horizon, page.before, page.fetch_limit())
        .await?;

    let response = paginate(rows, page.limit, |prediction| prediction.ts);
    state.cache_later(cache_key, &response, CACHE_TTL);

    Ok(Json(response))
}

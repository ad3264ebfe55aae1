//! Reroute recommendations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recommendation to divert traffic from a congested road to a less
/// congested adjacent one.
///
/// Identity is `(ts, route_id, alt_route_id)`; `alt_route_id` is always an
/// entry of the adjacency list of `route_id` and never equals it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reroute {
    pub ts: DateTime<Utc>,
    pub route_id: String,
    pub alt_route_id: String,
    pub reason: String,
    pub estimated_co2_gain: Option<f64>,
    pub eta_gain_min: Option<f64>,
}

//! Road registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A road segment from the static reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub road_id: String,
    pub label: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

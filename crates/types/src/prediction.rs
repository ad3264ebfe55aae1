//! Congestion forecasts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short-horizon congestion forecast for one road.
///
/// Identity is `(ts, road_id, horizon_min)` where `ts` is the start of the
/// producing cycle; re-running a cycle overwrites score, confidence, and
/// model version for the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub ts: DateTime<Utc>,
    pub road_id: String,
    pub horizon_min: i32,
    /// Unitless congestion score in [0, 1], rounded to 3 decimals
    pub congestion_score: f64,
    /// Forecast confidence in [0, 1], rounded to 2 decimals
    pub confidence: f64,
    pub model_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_field_names() {
        let p = Prediction {
            ts: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            road_id: "RING-NORTH-12".into(),
            horizon_min: 30,
            congestion_score: 0.723,
            confidence: 0.85,
            model_version: "ewma-lr-v2".into(),
        };

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["road_id"], "RING-NORTH-12");
        assert_eq!(json["horizon_min"], 30);
        assert_eq!(json["congestion_score"], 0.723);
        assert_eq!(json["confidence"], 0.85);
        assert_eq!(json["model_version"], "ewma-lr-v2");
    }
}

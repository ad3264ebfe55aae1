//! Raw traffic telemetry
//!
//! Sensors publish JSON payloads on the bus; the collector decodes them,
//! resolves timestamps, and validates required fields before storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated per-sensor traffic measurement.
///
/// Identity is `(ts, sensor_id)`; duplicate inserts are dropped by the
/// store, which makes ingest idempotent under bus redelivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub ts: DateTime<Utc>,
    pub sensor_id: String,
    pub road_id: String,
    pub speed_kmh: f64,
    pub flow_rate: f64,
    pub occupancy: f64,
}

/// Errors produced while decoding a bus payload into a sample.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Payload is not valid JSON
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A required identity field is missing or empty
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

/// Bus payload as published by sensors.
///
/// Only `sensor_id` and `road_id` are required. `ts` is RFC3339 and falls
/// back to the collector's wall clock when absent or unparseable; missing
/// numeric fields default to 0. `occupancy` is nominally in [0, 1] but is
/// not enforced at ingest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrafficPayload {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub sensor_id: String,
    #[serde(default)]
    pub road_id: String,
    #[serde(default)]
    pub speed_kmh: f64,
    #[serde(default)]
    pub flow_rate: f64,
    #[serde(default)]
    pub occupancy: f64,
}

impl RawTrafficPayload {
    /// Decode a raw payload from JSON bytes.
    pub fn decode(raw: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Resolve into a validated sample.
    ///
    /// `now` substitutes an absent or unparseable `ts`.
    pub fn into_sample(self, now: DateTime<Utc>) -> Result<TrafficSample, PayloadError> {
        let ts = self
            .ts
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(now);

        if self.sensor_id.is_empty() {
            return Err(PayloadError::MissingField("sensor_id"));
        }
        if self.road_id.is_empty() {
            return Err(PayloadError::MissingField("road_id"));
        }

        Ok(TrafficSample {
            ts,
            sensor_id: self.sensor_id,
            road_id: self.road_id,
            speed_kmh: self.speed_kmh,
            flow_rate: self.flow_rate,
            occupancy: self.occupancy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_full_payload() {
        let raw = br#"{
            "ts": "2024-06-01T11:59:30Z",
            "sensor_id": "S-001",
            "road_id": "RING-NORTH-12",
            "speed_kmh": 42.5,
            "flow_rate": 80.0,
            "occupancy": 0.35
        }"#;

        let sample = RawTrafficPayload::decode(raw)
            .unwrap()
            .into_sample(now())
            .unwrap();

        assert_eq!(sample.sensor_id, "S-001");
        assert_eq!(sample.road_id, "RING-NORTH-12");
        assert_eq!(sample.speed_kmh, 42.5);
        assert_eq!(sample.ts, Utc.with_ymd_and_hms(2024, 6, 1, 11, 59, 30).unwrap());
    }

    #[test]
    fn test_missing_ts_uses_wall_clock() {
        let raw = br#"{"sensor_id": "S-001", "road_id": "R-1"}"#;
        let sample = RawTrafficPayload::decode(raw)
            .unwrap()
            .into_sample(now())
            .unwrap();

        assert_eq!(sample.ts, now());
        assert_eq!(sample.speed_kmh, 0.0);
        assert_eq!(sample.flow_rate, 0.0);
        assert_eq!(sample.occupancy, 0.0);
    }

    #[test]
    fn test_unparseable_ts_uses_wall_clock() {
        let raw = br#"{"ts": "yesterday", "sensor_id": "S-001", "road_id": "R-1"}"#;
        let sample = RawTrafficPayload::decode(raw)
            .unwrap()
            .into_sample(now())
            .unwrap();

        assert_eq!(sample.ts, now());
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            RawTrafficPayload::decode(b"{not valid json}"),
            Err(PayloadError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_required_fields_rejected() {
        let missing_sensor = br#"{"road_id": "R-1"}"#;
        assert!(matches!(
            RawTrafficPayload::decode(missing_sensor)
                .unwrap()
                .into_sample(now()),
            Err(PayloadError::MissingField("sensor_id"))
        ));

        let missing_road = br#"{"sensor_id": "S-001"}"#;
        assert!(matches!(
            RawTrafficPayload::decode(missing_road)
                .unwrap()
                .into_sample(now()),
            Err(PayloadError::MissingField("road_id"))
        ));
    }

    #[test]
    fn test_occupancy_not_bounded_at_ingest() {
        // Out-of-range occupancy is accepted here; the predictor clamps
        // its final score instead.
        let raw = br#"{"sensor_id": "S-001", "road_id": "R-1", "occupancy": 1.5}"#;
        let sample = RawTrafficPayload::decode(raw)
            .unwrap()
            .into_sample(now())
            .unwrap();

        assert_eq!(sample.occupancy, 1.5);
    }
}

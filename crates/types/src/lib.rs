//! CityFlow domain types
//!
//! Shared wire and storage models for the traffic analytics pipeline:
//! raw sensor payloads, validated samples, forecasts, reroute
//! recommendations, the road registry, and user accounts.
//!
//! Pipeline stages and the query API all speak these types; the JSON field
//! names are the public wire contract and must not drift between stages.

mod prediction;
mod reroute;
mod road;
mod traffic;
mod user;

pub use prediction::Prediction;
pub use reroute::Reroute;
pub use road::Road;
pub use traffic::{PayloadError, RawTrafficPayload, TrafficSample};
pub use user::User;

/// Pub/sub channel names shared across the pipeline.
pub mod channels {
    /// Raw traffic payloads, republished by the collector as received.
    pub const LIVE: &str = "cityflow:live";
    /// One JSON [`Prediction`](crate::Prediction) per message.
    pub const PREDICTIONS: &str = "cityflow:predictions";
    /// One JSON [`Reroute`](crate::Reroute) per message.
    pub const REROUTES: &str = "cityflow:reroutes";
}

//! CityFlow configuration
//!
//! Environment-driven configuration with sensible defaults. Every stage
//! reads only the sections it needs; unset variables fall back to local
//! development defaults, and malformed values are startup errors rather
//! than silent fallbacks.
//!
//! # Example
//!
//! ```
//! use cityflow_config::DatabaseConfig;
//!
//! let db = DatabaseConfig::from_env().unwrap();
//! assert!(db.dsn().starts_with("postgres://"));
//! ```

mod api;
mod database;
mod error;
mod mqtt;
mod predictor;
mod redis;
mod rerouter;

pub use api::{CorsConfig, JwtConfig, ServerConfig};
pub use database::DatabaseConfig;
pub use error::{ConfigError, Result};
pub use mqtt::MqttConfig;
pub use predictor::PredictorConfig;
pub use redis::RedisConfig;
pub use rerouter::RerouterConfig;

/// Metrics/health listener address (`METRICS_ADDR`, default `:8080`).
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub addr: String,
}

impl MetricsConfig {
    pub fn from_env() -> Self {
        let addr = lookup_env("METRICS_ADDR").unwrap_or_else(|| ":8080".to_string());
        Self {
            addr: normalize_addr(&addr),
        }
    }
}

/// Expand a bare `:port` listen address into a bindable `host:port`.
fn normalize_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}

pub(crate) fn lookup_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub(crate) fn get_env(lookup: &dyn Fn(&str) -> Option<String>, key: &str, fallback: &str) -> String {
    lookup(key).unwrap_or_else(|| fallback.to_string())
}

pub(crate) fn get_env_u16(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &'static str,
    fallback: u16,
) -> Result<u16> {
    match lookup(key) {
        None => Ok(fallback),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: key,
            value: raw,
            expected: "a port number",
        }),
    }
}

pub(crate) fn get_env_u64(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &'static str,
    fallback: u64,
) -> Result<u64> {
    match lookup(key) {
        None => Ok(fallback),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: key,
            value: raw,
            expected: "a non-negative integer",
        }),
    }
}

pub(crate) fn get_env_i64(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &'static str,
    fallback: i64,
) -> Result<i64> {
    match lookup(key) {
        None => Ok(fallback),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: key,
            value: raw,
            expected: "an integer",
        }),
    }
}

pub(crate) fn get_env_f64(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &'static str,
    fallback: f64,
) -> Result<f64> {
    match lookup(key) {
        None => Ok(fallback),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: key,
            value: raw,
            expected: "a number",
        }),
    }
}

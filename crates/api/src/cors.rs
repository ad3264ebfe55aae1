//! CORS layer
//!
//! A wildcard policy allows every origin without credentials (browsers
//! reject `*` with credentials); an explicit origin list allows
//! credentialed requests from exactly those origins.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use cityflow_config::CorsConfig;

const MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

const METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from configuration.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(METHODS)
        .expose_headers([CONTENT_LENGTH])
        .max_age(MAX_AGE);

    if config.is_wildcard() {
        return layer
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_credentials(false);
    }

    let origins: Vec<HeaderValue> = config
        .origins()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(origins)
        .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

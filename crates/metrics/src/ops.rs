//! Stage ops endpoint
//!
//! Every long-running stage serves `/health` and `/metrics` on its own
//! listener so liveness probes and scrapers never touch the data path.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::StageMetrics;

/// Errors from the ops listener
#[derive(Debug, Error)]
pub enum OpsError {
    /// Could not bind the configured address
    #[error("failed to bind ops listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server terminated with an error
    #[error("ops server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Serve `/health` and `/metrics` until cancelled.
pub async fn serve_ops(
    addr: String,
    metrics: Arc<StageMetrics>,
    cancel: CancellationToken,
) -> Result<(), OpsError> {
    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(scrape))
        .with_state(metrics);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| OpsError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(addr = %addr, "metrics server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn scrape(State(metrics): State<Arc<StageMetrics>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_and_scrape() {
        use tower::util::ServiceExt;

        let metrics = Arc::new(StageMetrics::new("collector", "messages"));
        metrics.received.inc();

        let app = Router::new()
            .route("/health", get(health))
            .route("/metrics", get(scrape))
            .with_state(metrics);

        let res = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), axum::http::StatusCode::OK);

        let res = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/metrics")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("cityflow_collector_messages_received_total 1"));
    }
}

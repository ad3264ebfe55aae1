//! Live WebSocket bridge
//!
//! Upgrades authenticated clients and forwards every message from the
//! live fan-out channel as `{"type": "traffic_update", "data": <payload>}`.
//! The token rides in the query string because browser WebSocket APIs
//! cannot set headers; it must never be logged as part of a URL.
//!
//! Two tasks cooperate per connection: a read pump that only watches for
//! the peer closing, and the subscription-drain write loop. Either side
//! ending cancels the other through a shared child token of the process
//! cancellation signal.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use cityflow_types::channels;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// GET /ws/live?token=...
pub async fn live(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = params.token else {
        return ApiError::MissingToken.into_response();
    };

    if state.tokens.validate(&token).is_err() {
        return ApiError::InvalidToken.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = match state.cache.subscribe(channels::LIVE).await {
        Ok(subscription) => subscription,
        Err(err) => {
            warn!(error = %err, "live subscription unavailable, closing socket");
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    // Shared cancellation: the process signal is the parent, so shutdown
    // also drains every connected client.
    let cancel = state.cancel.child_token();

    let read_cancel = cancel.clone();
    let read_pump = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {} // Inbound frames carry nothing; drain them.
            }
        }
        read_cancel.cancel();
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            message = subscription.next_message() => {
                let Some(payload) = message else { break };
                let frame = json!({
                    "type": "traffic_update",
                    "data": payload,
                });
                if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                    debug!("ws write failed, client gone");
                    break;
                }
            }
        }
    }

    cancel.cancel();
    read_pump.abort();
}

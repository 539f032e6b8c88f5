//! Stream-open and message-delivery adapters.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::{BufferedSink, Envelope, EventStreamTransport};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /events
///
/// Opens a session: builds a buffered sink, binds a transport to it, runs
/// the handshake, and replays the captured output as one finite response.
/// The session id must be registered before the first await so a delivery
/// request racing the handshake can already resolve it; the session stays
/// registered after the response is returned and is expired by the reaper.
pub async fn open_stream(State(state): State<AppState>) -> ApiResult<Response> {
    let sink = BufferedSink::new();
    let transport = Arc::new(EventStreamTransport::new(&state.message_endpoint, sink));
    let session_id = transport.session_id().to_string();

    state.registry.put(&session_id, transport.clone());

    if let Err(err) = state.bridge.connect(&transport).await {
        state.registry.remove(&session_id);
        return Err(ApiError::internal(format!("transport handshake failed: {err}")));
    }

    let captured = match transport.finish() {
        Ok(captured) => captured,
        Err(err) => {
            state.registry.remove(&session_id);
            return Err(ApiError::internal(format!("failed to drain stream buffer: {err}")));
        }
    };

    info!(session_id = %session_id, "stream opened");

    let mut response = Response::new(Body::from(captured.body));
    *response.status_mut() = captured.status;
    *response.headers_mut() = captured.headers;
    Ok(response)
}

/// Query parameters for message delivery.
#[derive(Debug, Deserialize)]
pub struct DeliveryParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// POST /messages?sessionId=...
///
/// Forwards a decoded envelope into the session's transport. Responses
/// carry no body: 200 on success, 404 for an unknown session, 500 when
/// the handler fails. A failed delivery never tears down the session.
pub async fn deliver_message(
    State(state): State<AppState>,
    Query(params): Query<DeliveryParams>,
    Json(envelope): Json<Envelope>,
) -> StatusCode {
    let Some(transport) = state.registry.get(&params.session_id) else {
        debug!(session_id = %params.session_id, "delivery for unknown session");
        return StatusCode::NOT_FOUND;
    };

    match transport.handle_message(envelope).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            warn!(session_id = %params.session_id, error = %err, "message delivery failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

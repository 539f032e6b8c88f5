//! Shared test fixtures.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use sse_bridge::api::{AppState, create_router};
use sse_bridge::bridge::{BridgeServer, Envelope, MessageHandler};

/// Handler that records every envelope it receives.
#[derive(Default)]
pub struct RecordingHandler {
    received: Mutex<Vec<(String, Envelope)>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(String, Envelope)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle_message(&self, session_id: &str, envelope: Envelope) -> anyhow::Result<()> {
        self.received
            .lock()
            .unwrap()
            .push((session_id.to_string(), envelope));
        Ok(())
    }
}

/// Handler that fails while the flag is set.
#[derive(Default)]
pub struct TogglingHandler {
    failing: AtomicBool,
}

impl TogglingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageHandler for TogglingHandler {
    async fn handle_message(&self, _session_id: &str, _envelope: Envelope) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("simulated handler failure");
        }
        Ok(())
    }
}

/// Build a router plus the state backing it, using the given handler.
pub fn test_app(handler: Arc<dyn MessageHandler>) -> (Router, AppState) {
    let state = AppState::new(BridgeServer::new(handler), "/messages");
    (create_router(state.clone()), state)
}

/// Open a stream and return the response status, captured body, and the
/// session id parsed from the handshake output.
pub async fn open_session(app: &Router) -> (StatusCode, String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/events")
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    let session_id = parse_session_id(&body);
    (status, session_id, body)
}

/// POST a payload to the delivery endpoint for the given session id.
pub async fn deliver(app: &Router, session_id: &str, payload: Value) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/messages?sessionId={session_id}"))
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

fn parse_session_id(body: &str) -> String {
    let start = body
        .find("sessionId=")
        .map(|idx| idx + "sessionId=".len())
        .unwrap_or(body.len());
    body[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit() || *c == '-')
        .collect()
}

//! Server-side event-stream transport bound to a buffered sink.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::sink::{BufferedSink, CapturedResponse, SinkError};

/// Errors raised by transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("transport is not connected")]
    NotConnected,

    #[error("transport is already connected")]
    AlreadyConnected,

    #[error("message handler failed: {0}")]
    Handler(#[source] anyhow::Error),
}

/// Protocol message envelope delivered out-of-band into a session.
///
/// Only the discriminator is inspected here; the payload is opaque to the
/// bridge and passed through to the installed handler untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

/// Handles decoded message envelopes for a session.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, session_id: &str, envelope: Envelope) -> anyhow::Result<()>;
}

/// One logical streaming connection, writing through a [`BufferedSink`].
///
/// The transport generates its own session id at construction time so the
/// registry can be keyed before the handshake runs.
pub struct EventStreamTransport {
    session_id: String,
    message_endpoint: String,
    sink: Mutex<BufferedSink>,
    handler: OnceLock<Arc<dyn MessageHandler>>,
}

impl EventStreamTransport {
    /// Create a transport that announces `message_endpoint` as the path
    /// for out-of-band message delivery.
    pub fn new(message_endpoint: &str, sink: BufferedSink) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            message_endpoint: message_endpoint.to_string(),
            sink: Mutex::new(sink),
            handler: OnceLock::new(),
        }
    }

    /// The opaque session identifier assigned to this transport.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub(super) fn bind_handler(&self, handler: Arc<dyn MessageHandler>) -> Result<(), TransportError> {
        self.handler
            .set(handler)
            .map_err(|_| TransportError::AlreadyConnected)
    }

    /// Run the handshake: write the event-stream head and announce the
    /// delivery endpoint for this session.
    pub(super) fn start(&self) -> Result<(), TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let mut sink = self.sink();
        sink.write_head(StatusCode::OK, headers)?;
        sink.write(&format!(
            "event: endpoint\ndata: {}?sessionId={}\n",
            self.message_endpoint, self.session_id
        ))?;
        debug!(session_id = %self.session_id, "transport handshake written");
        Ok(())
    }

    /// Forward a decoded envelope to the handler installed at connect time.
    ///
    /// A handler failure is isolated to this call: the sink and the
    /// session's registration are left untouched.
    pub async fn handle_message(&self, envelope: Envelope) -> Result<(), TransportError> {
        let handler = self.handler.get().ok_or(TransportError::NotConnected)?;
        handler
            .handle_message(&self.session_id, envelope)
            .await
            .map_err(|err| {
                warn!(session_id = %self.session_id, error = %err, "message handler failed");
                TransportError::Handler(err)
            })
    }

    /// Close the sink and return the captured response.
    pub fn finish(&self) -> Result<CapturedResponse, TransportError> {
        Ok(self.sink().close()?)
    }

    fn sink(&self) -> MutexGuard<'_, BufferedSink> {
        self.sink.lock().expect("sink lock poisoned")
    }
}

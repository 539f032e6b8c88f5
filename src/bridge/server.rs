//! Protocol server: owns the message handler and runs transport handshakes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::transport::{Envelope, EventStreamTransport, MessageHandler, TransportError};

/// Higher-level protocol server that connects transports.
///
/// The handler installed here receives every message delivered into any
/// session; per-session state, if a handler needs it, is keyed off the
/// session id it is given.
pub struct BridgeServer {
    handler: Arc<dyn MessageHandler>,
}

impl BridgeServer {
    pub fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self { handler }
    }

    /// Complete the handshake on a freshly constructed transport.
    ///
    /// Installs the server's message handler and writes the handshake
    /// frames through the transport's sink. Connecting the same transport
    /// twice is an error.
    pub async fn connect(&self, transport: &EventStreamTransport) -> Result<(), TransportError> {
        transport.bind_handler(self.handler.clone())?;
        transport.start()?;
        info!(session_id = %transport.session_id(), "transport connected");
        Ok(())
    }
}

/// Default production handler: acknowledges every envelope.
///
/// Message semantics are protocol-defined and out of scope for the bridge,
/// so the stock server only logs what it receives.
pub struct AckHandler;

#[async_trait]
impl MessageHandler for AckHandler {
    async fn handle_message(&self, session_id: &str, envelope: Envelope) -> anyhow::Result<()> {
        debug!(
            session_id,
            kind = envelope.kind.as_deref().unwrap_or("unknown"),
            "message acknowledged"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::sink::BufferedSink;

    #[tokio::test]
    async fn test_connect_writes_handshake_and_installs_handler() {
        let server = BridgeServer::new(Arc::new(AckHandler));
        let transport = EventStreamTransport::new("/messages", BufferedSink::new());

        server.connect(&transport).await.unwrap();

        let envelope = serde_json::from_value(serde_json::json!({ "type": "ping" })).unwrap();
        transport.handle_message(envelope).await.unwrap();

        let captured = transport.finish().unwrap();
        assert!(captured.body.contains("event: endpoint"));
    }

    #[tokio::test]
    async fn test_connect_twice_rejected() {
        let server = BridgeServer::new(Arc::new(AckHandler));
        let transport = EventStreamTransport::new("/messages", BufferedSink::new());

        server.connect(&transport).await.unwrap();
        assert!(matches!(
            server.connect(&transport).await,
            Err(TransportError::AlreadyConnected)
        ));
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::bridge::BridgeServer;
use crate::session::SessionRegistry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry of open sessions, injected into both adapters.
    pub registry: Arc<SessionRegistry>,
    /// Protocol server that connects freshly opened transports.
    pub bridge: Arc<BridgeServer>,
    /// Path announced to clients for out-of-band message delivery.
    pub message_endpoint: String,
    /// Origins allowed by the CORS layer; empty means permissive.
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(bridge: BridgeServer, message_endpoint: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            bridge: Arc::new(bridge),
            message_endpoint: message_endpoint.into(),
            allowed_origins: Vec::new(),
        }
    }

    /// Set the origins allowed by the CORS layer.
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }
}

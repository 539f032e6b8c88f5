//! Buffered stand-in for a live streaming HTTP response.
//!
//! A transport writes its handshake and event frames through this sink as
//! if it held a real long-lived connection. The sink captures status,
//! headers, and body chunks, and `close` finalizes them into the single
//! finite response that the stream-open handler replays to the caller.

use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;

/// Errors raised by sink operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("sink is already closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Open,
    Closed,
}

/// The final status/headers/body tuple produced when a sink closes.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// In-memory response sink with an explicit `Open -> Closed` lifecycle.
///
/// Writes after close are rejected rather than silently dropped; a second
/// close is an error as well, so the captured response is produced exactly
/// once.
#[derive(Debug)]
pub struct BufferedSink {
    state: SinkState,
    status: Option<StatusCode>,
    headers: HeaderMap,
    chunks: Vec<String>,
}

impl BufferedSink {
    /// Create an open sink with no status, headers, or body captured yet.
    pub fn new() -> Self {
        Self {
            state: SinkState::Open,
            status: None,
            headers: HeaderMap::new(),
            chunks: Vec::new(),
        }
    }

    /// Capture the response status and headers.
    ///
    /// The sink records whatever the transport writes; it does not enforce
    /// headers-before-body ordering beyond rejecting writes after close.
    pub fn write_head(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), SinkError> {
        self.ensure_open()?;
        self.status = Some(status);
        self.headers = headers;
        Ok(())
    }

    /// Append a body chunk.
    pub fn write(&mut self, chunk: &str) -> Result<(), SinkError> {
        self.ensure_open()?;
        self.chunks.push(chunk.to_string());
        Ok(())
    }

    /// Close the sink, yielding the captured response.
    ///
    /// Chunks are joined with newline separators. A status that was never
    /// set defaults to 200.
    pub fn close(&mut self) -> Result<CapturedResponse, SinkError> {
        self.ensure_open()?;
        self.state = SinkState::Closed;
        Ok(CapturedResponse {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: std::mem::take(&mut self.headers),
            body: self.chunks.join("\n"),
        })
    }

    /// Whether the sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.state == SinkState::Closed
    }

    fn ensure_open(&self) -> Result<(), SinkError> {
        match self.state {
            SinkState::Open => Ok(()),
            SinkState::Closed => Err(SinkError::Closed),
        }
    }
}

impl Default for BufferedSink {
    fn default() -> Self {
        Self::new()
    }
}

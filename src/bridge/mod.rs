//! Streaming-transport bridge.
//!
//! Adapts a push-style event-stream transport onto a buffered
//! request/response cycle: the transport writes its handshake through a
//! [`BufferedSink`] instead of a live socket, and the captured output is
//! replayed as one finite HTTP response.

mod server;
mod sink;
mod transport;

pub use server::{AckHandler, BridgeServer};
pub use sink::{BufferedSink, CapturedResponse, SinkError};
pub use transport::{Envelope, EventStreamTransport, MessageHandler, TransportError};

//! SSE Bridge Library
//!
//! Adapts a bidirectional streaming protocol (a server-to-client event
//! stream plus an out-of-band client-to-server message channel) onto a
//! plain request/response web server. The streaming side is captured into
//! a buffered sink and replayed as one finite response; a session registry
//! lets later requests deliver messages into the transport created by the
//! initial stream-open request.

pub mod api;
pub mod bridge;
pub mod session;
pub mod settings;

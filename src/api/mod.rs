//! HTTP API module.
//!
//! Provides the stream-open and message-delivery endpoints that adapt the
//! streaming transport onto the request/response cycle.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;

//! HTTP API layer for pictogram.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: following, posts, messaging, users
//! - **Extractors**: Authentication
//! - **Middleware**: Token auth
//! - **Streaming**: WebSocket direct-message delivery
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::router;
pub use middleware::AppState;
pub use streaming::streaming_handler;

//! Public HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, admin session marker, metadata)
//!     → Gateway::resolve_resource
//!     → response.rs (status code, decision headers, JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_metadata, AdminSession, MakeRequestUuid, X_REQUEST_ID};
pub use response::{X_GATEWAY_DECISION, X_GATEWAY_DENIAL};
pub use server::HttpServer;

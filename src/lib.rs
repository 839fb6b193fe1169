//! Condominium resource resolution gateway.
//!
//! Resolves named resources (residents, devices, vendors, admin models) to
//! their on-disk descriptors behind a layered security pipeline: network
//! origin, per-client request budget, sensitivity tier authorization and a
//! bounded resolution cache, with per-client telemetry and scoring.

// Core pipeline
pub mod cache;
pub mod config;
pub mod gateway;
pub mod geo;
pub mod registry;
pub mod security;
pub mod telemetry;

// Surfaces
pub mod admin;
pub mod http;

// Cross-cutting concerns
pub mod clock;
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use gateway::{Gateway, GatewayError, RequestMetadata, SecurityDecision};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

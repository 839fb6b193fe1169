//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the public resolution surface
//! - Wire up middleware (panic capture, tracing, request ID, timeout,
//!   admin session marker)
//! - Apply configuration updates from the watcher while serving
//! - Stop on the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::{Gateway, SecurityDecision};
use crate::geo::extract_client_ip;
use crate::http::request::{
    admin_session_layer, request_metadata, x_request_id, AdminSession, MakeRequestUuid,
};

/// Public HTTP front of the gateway.
pub struct HttpServer {
    router: Router,
    gateway: Arc<Gateway>,
}

impl HttpServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let router = Self::build_router(gateway.clone());
        Self { router, gateway }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(gateway: Arc<Gateway>) -> Router {
        let timeout = Duration::from_secs(gateway.config().timeouts.request_secs);

        Router::new()
            .route("/resources/{name}", get(resolve_handler))
            .route("/health", get(health_handler))
            .layer(middleware::from_fn_with_state(gateway.clone(), admin_session_layer))
            .with_state(gateway)
            .layer(
                ServiceBuilder::new()
                    .layer(CatchPanicLayer::new())
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::new(x_request_id(), MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::new(x_request_id()))
                    .layer(TimeoutLayer::new(timeout)),
            )
    }

    /// Serve until `shutdown` fires, applying configs from `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let gateway = self.gateway.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = gateway.apply_config(config) {
                    tracing::error!(error = %e, "Rejected configuration update. Keeping current configuration.");
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        result
    }
}

async fn resolve_handler(
    State(gateway): State<Arc<Gateway>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Path(name): Path<String>,
    session: Option<Extension<AdminSession>>,
    headers: HeaderMap,
) -> SecurityDecision {
    let config = gateway.config();
    let ip = extract_client_ip(&headers, Some(remote), &config.client_ip);
    let metadata = request_metadata(&headers, session.is_some());

    gateway.resolve_resource(ip, &name, &metadata)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    generation: u64,
}

async fn health_handler(State(gateway): State<Arc<Gateway>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        generation: gateway.generation(),
    })
}

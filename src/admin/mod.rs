//! Admin API, served on its own listener behind the admin bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::gateway::Gateway;
use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn setup_admin_router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/stats", get(get_stats))
        .route("/admin/clients", get(get_clients))
        .route("/admin/clients/{ip}", get(get_client))
        .route("/admin/cache", get(get_cache))
        .route("/admin/reset", post(post_reset))
        .layer(middleware::from_fn_with_state(gateway.clone(), admin_auth_middleware))
        .with_state(gateway)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve_admin(
    listener: TcpListener,
    gateway: Arc<Gateway>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(gateway))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::cache::CacheEntry;
use crate::gateway::{Gateway, GlobalStats};
use crate::telemetry::ClientReport;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub generation: u64,
}

#[derive(Serialize)]
pub struct CacheView {
    pub entries: usize,
    pub capacity: usize,
    pub items: Vec<CacheEntry>,
}

pub async fn get_status(State(gateway): State<Arc<Gateway>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        generation: gateway.generation(),
    })
}

pub async fn get_stats(State(gateway): State<Arc<Gateway>>) -> Json<GlobalStats> {
    Json(gateway.global_stats())
}

pub async fn get_clients(
    State(gateway): State<Arc<Gateway>>,
) -> Json<BTreeMap<String, ClientReport>> {
    Json(gateway.all_client_stats())
}

pub async fn get_client(
    State(gateway): State<Arc<Gateway>>,
    Path(ip): Path<String>,
) -> Result<Json<ClientReport>, StatusCode> {
    gateway.client_stats(&ip).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn get_cache(State(gateway): State<Arc<Gateway>>) -> Json<CacheView> {
    let stats = gateway.global_stats();
    Json(CacheView {
        entries: stats.cache_entries,
        capacity: stats.cache_capacity,
        items: gateway.cache_snapshot(),
    })
}

pub async fn post_reset(State(gateway): State<Arc<Gateway>>) -> Response {
    match gateway.reset() {
        Ok(()) => Json(serde_json::json!({
            "status": "reset",
            "generation": gateway.generation(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Admin reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

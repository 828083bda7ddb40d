use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Xtream Reseller Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust"
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LicenseStats {
    expires_at: DateTime<Utc>,
    expired: bool,
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    uptime: u64,
    storage: String,
    license: LicenseStats,
    sources: usize,
    accounts: usize,
}

/// GET /health - Service health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();
    let expired = state.license.is_expired(Utc::now());

    let sources = state.assembler.list_sources().await.len();
    let accounts = state.store.read_accounts().await.len();

    // Players are refused while the license is expired
    let status = if expired { "degraded" } else { "ok" };

    Json(HealthResponse {
        status: status.to_string(),
        uptime,
        storage: state.store.describe(),
        license: LicenseStats {
            expires_at: state.license.expires_at,
            expired,
        },
        sources,
        accounts,
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                b"Internal Server Error".to_vec(),
            )
        }
    }
}

/// Liveness probe
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}

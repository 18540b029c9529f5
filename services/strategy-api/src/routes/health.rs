//! Health check endpoints

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /health, /api/health - liveness/readiness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, body = HealthResponse)),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.has_db {
        "healthy"
    } else {
        "degraded (no database)"
    };

    Json(HealthResponse {
        status: status.to_string(),
        service: "strategy-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /ready - readiness probe, distinct from `/health` so the auth
/// middleware's always-public path list (spec.md §6) stays explicit.
pub async fn ready_check() -> &'static str {
    "ready"
}

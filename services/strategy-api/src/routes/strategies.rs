//! The one REST endpoint spec.md §6 names: `GET /api/strategies/{id}`.
//!
//! Everything else in spec.md §6 ("Tool surface") is exposed over MCP
//! (`src/mcp/tools.rs`); this handler is a thin Axum wrapper around the same
//! `StrategyService::get_strategy` call the MCP tool uses, grounded on
//! `familiar-api`'s one-handler-per-route style (`routes/channels.rs`).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::http_error::HttpError;
use crate::state::AppState;

/// `GET /api/strategies/{id}` → `{strategy, cards, card_count}`, or `404`
/// with `{"error": "..."}` when the strategy does not exist (spec.md §8
/// scenario 6).
#[utoipa::path(
    get,
    path = "/api/strategies/{id}",
    params(("id" = String, Path, description = "Strategy id")),
    responses(
        (status = 200, description = "Strategy with attached cards"),
        (status = 404, description = "Strategy not found"),
    ),
    tag = "strategies"
)]
pub async fn get_strategy_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let response = state.service.get_strategy(&id).await?;
    Ok(Json(serde_json::to_value(response).unwrap_or_default()))
}

//! Maps a [`compiler_core::ToolError`] onto an HTTP response.
//!
//! spec.md §6 only pins down the shape for the one REST endpoint
//! (`404` with `{error: string}` on a missing strategy); every other code in
//! the taxonomy (spec.md §4.G) still needs *some* status, so this gives each
//! a reasonable one rather than collapsing everything to 500, the way the
//! teacher's `AuthError` (`middleware/mod.rs`) maps its two codes to
//! `401`/`403` instead of a single catch-all status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use compiler_core::{ErrorCode, ToolError};
use serde::Serialize;

/// spec.md §8 scenario 6 pins the exact body down to `{"error": "..."}` for
/// the one REST endpoint this service exposes; kept to that single field
/// rather than folding in `code`/`recovery_hint` so the literal contract
/// holds (those richer fields are still in the `Display`-folded message and
/// in the MCP tool surface's structured `ToolError`).
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HttpErrorBody {
    pub error: String,
}

pub struct HttpError(pub ToolError);

impl From<ToolError> for HttpError {
    fn from(err: ToolError) -> Self {
        Self(err)
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound
        | ErrorCode::CardNotFound
        | ErrorCode::StrategyNotFound
        | ErrorCode::ArchetypeNotFound
        | ErrorCode::SchemaNotFound
        | ErrorCode::AttachmentNotFound => StatusCode::NOT_FOUND,
        ErrorCode::ValidationError
        | ErrorCode::SchemaValidationError
        | ErrorCode::SchemaEtagMismatch
        | ErrorCode::InvalidRole
        | ErrorCode::InvalidStatus
        | ErrorCode::DuplicateAttachment => StatusCode::BAD_REQUEST,
        ErrorCode::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::NetworkError | ErrorCode::DatabaseError => StatusCode::BAD_GATEWAY,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);
        let body = HttpErrorBody { error: self.0.message };
        (status, Json(body)).into_response()
    }
}

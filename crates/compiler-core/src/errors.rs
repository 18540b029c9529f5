//! Structured error model (component G).
//!
//! Every tool-facing failure is a [`ToolError`] carrying a machine-readable
//! [`ErrorCode`], a human message, a recovery hint, and a details map. The
//! message repeats the code and hint inline (`Display` appends them) because
//! some transports flatten a structured error down to a single string —
//! grounded on `errors.py`'s `StructuredToolError.__str__`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The stable, transport-agnostic error code taxonomy (spec.md §4.G). This
/// set is a contract: do not rename or remove a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    CardNotFound,
    StrategyNotFound,
    ArchetypeNotFound,
    SchemaNotFound,
    ValidationError,
    SchemaValidationError,
    SchemaEtagMismatch,
    InvalidRole,
    InvalidStatus,
    DuplicateAttachment,
    AttachmentNotFound,
    DatabaseError,
    NetworkError,
    TimeoutError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::CardNotFound => "CARD_NOT_FOUND",
            ErrorCode::StrategyNotFound => "STRATEGY_NOT_FOUND",
            ErrorCode::ArchetypeNotFound => "ARCHETYPE_NOT_FOUND",
            ErrorCode::SchemaNotFound => "SCHEMA_NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::SchemaValidationError => "SCHEMA_VALIDATION_ERROR",
            ErrorCode::SchemaEtagMismatch => "SCHEMA_ETAG_MISMATCH",
            ErrorCode::InvalidRole => "INVALID_ROLE",
            ErrorCode::InvalidStatus => "INVALID_STATUS",
            ErrorCode::DuplicateAttachment => "DUPLICATE_ATTACHMENT",
            ErrorCode::AttachmentNotFound => "ATTACHMENT_NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::TimeoutError => "TIMEOUT_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may reasonably retry the operation unchanged.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::DatabaseError | ErrorCode::NetworkError | ErrorCode::TimeoutError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured, tool-facing error. Implements `std::error::Error` and a
/// `Display` that folds the structured fields back into a single string, so
/// transports that can only carry text still get the code and hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    pub recovery_hint: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>, recovery_hint: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            recovery_hint: recovery_hint.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "code": self.code.as_str(),
            "message": self.message,
            "recovery_hint": self.recovery_hint,
            "details": self.details,
        })
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{entity} not found: {id}"),
            format!("Verify the {entity} id and try again."),
        )
        .with_detail("id", id)
    }

    pub fn card_not_found(card_id: &str) -> Self {
        Self::new(
            ErrorCode::CardNotFound,
            format!("Card not found: {card_id}"),
            "Verify the card id, or list cards to find a valid one.",
        )
        .with_detail("card_id", card_id)
    }

    pub fn strategy_not_found(strategy_id: &str) -> Self {
        Self::new(
            ErrorCode::StrategyNotFound,
            format!("Strategy not found: {strategy_id}"),
            "Verify the strategy id, or list strategies to find a valid one.",
        )
        .with_detail("strategy_id", strategy_id)
    }

    pub fn archetype_not_found(type_id: &str) -> Self {
        Self::new(
            ErrorCode::ArchetypeNotFound,
            format!("Archetype not found: {type_id}"),
            "Call get_archetypes to list valid archetype type identifiers.",
        )
        .with_detail("type_id", type_id)
    }

    pub fn schema_not_found(type_id: &str) -> Self {
        Self::new(
            ErrorCode::SchemaNotFound,
            format!("Schema not found for archetype: {type_id}"),
            "The catalog is missing a schema for this archetype; contact the catalog owner.",
        )
        .with_detail("type_id", type_id)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::ValidationError,
            message,
            "Check the argument shapes against the tool's documented parameters.",
        )
    }

    /// Grounded on `errors.py::schema_validation_error`: the default recovery
    /// hint points at the `archetype-schemas://{kind}` resource (here, the
    /// `browse_archetype_schemas` tool) so an agent can self-correct.
    pub fn schema_validation_error(type_id: &str, errors: Vec<String>) -> Self {
        let kind = type_id.split('.').next().unwrap_or(type_id);
        Self::new(
            ErrorCode::SchemaValidationError,
            format!("Slots for '{type_id}' failed schema validation: {}", errors.join("; ")),
            format!("Call browse_archetype_schemas(kind=\"{kind}\") to see the expected shape."),
        )
        .with_detail("type_id", type_id)
        .with_detail("errors", serde_json::to_value(errors).unwrap_or_default())
    }

    pub fn schema_etag_mismatch(type_id: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::SchemaEtagMismatch,
            format!(
                "Schema etag mismatch for '{type_id}': client had '{expected}', catalog has '{actual}'"
            ),
            "Re-fetch the schema and re-validate before retrying the write.",
        )
        .with_detail("type_id", type_id)
        .with_detail("expected_etag", expected)
        .with_detail("actual_etag", actual)
    }

    pub fn invalid_role(role: &str) -> Self {
        Self::new(
            ErrorCode::InvalidRole,
            format!("Invalid role: {role}"),
            "role must be one of entry, gate, exit, overlay.",
        )
        .with_detail("role", role)
    }

    pub fn invalid_status(status: &str) -> Self {
        Self::new(
            ErrorCode::InvalidStatus,
            format!("Invalid status: {status}"),
            "status must be one of draft, ready, running, paused, stopped, error.",
        )
        .with_detail("status", status)
    }

    pub fn duplicate_attachment(card_id: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateAttachment,
            format!("Card is already attached: {card_id}"),
            "Use update the existing attachment instead of attaching the same card twice.",
        )
        .with_detail("card_id", card_id)
    }

    pub fn attachment_not_found(card_id: &str) -> Self {
        Self::new(
            ErrorCode::AttachmentNotFound,
            format!("No attachment found for card: {card_id}"),
            "Verify the card id is actually attached to this strategy.",
        )
        .with_detail("card_id", card_id)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DatabaseError,
            message,
            "This is a transient storage failure; the caller may retry.",
        )
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NetworkError,
            message,
            "This is a transient network failure; the caller may retry.",
        )
    }

    pub fn timeout_error(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TimeoutError,
            message,
            "The operation exceeded its deadline; the caller may retry with a longer timeout.",
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalError,
            message,
            "This indicates a bug; it is not retryable. Report it if it recurs.",
        )
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Error code: {}. Recovery hint: {}",
            self.message, self.code, self.recovery_hint
        )
    }
}

impl std::error::Error for ToolError {}

pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_code_and_hint_inline() {
        let err = ToolError::strategy_not_found("abc-123");
        let s = err.to_string();
        assert!(s.contains("STRATEGY_NOT_FOUND"));
        assert!(s.contains("abc-123"));
        assert!(s.contains("Recovery hint:"));
    }

    #[test]
    fn to_json_omits_empty_details_when_absent() {
        let err = ToolError::internal_error("boom");
        let json = err.to_json();
        assert_eq!(json["code"], "INTERNAL_ERROR");
    }
}

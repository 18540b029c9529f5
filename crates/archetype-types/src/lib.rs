//! Archetype Types
//!
//! Semantic ID types and the `SlotTree` JSON value type shared across the
//! strategy compiler. This crate carries no business logic: it exists so
//! that `compiler-core` and `strategy-api` agree on a single vocabulary for
//! identifiers and slot data instead of passing raw `String`/`serde_json::Value`
//! around.
//!
//! Card and strategy slots are arbitrary JSON validated against an
//! externally-defined schema (see `compiler-core::validator`); they are
//! intentionally NOT modeled as per-archetype Rust structs. The validator is
//! the authority, not the static type system. `SlotTree` keeps slots as
//! opaque JSON plus a handful of ergonomic accessors for the fixed paths the
//! compiler actually reads: `context.symbol`, `context.tf`,
//! `event.condition`/`event.regime`, `action.execution`/`action.sizing`, and
//! `event.lead_follow.follower_symbol`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Macro for defining UUID-based ID primitive types
// =============================================================================

macro_rules! define_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            #[inline]
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }

            #[inline]
            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

define_id!(CardId, "A card's store-assigned unique identifier");
define_id!(StrategyId, "A strategy's store-assigned unique identifier");

// =============================================================================
// Archetype identifier
// =============================================================================

/// Error returned when a string does not have the `<kind>.<name>` shape an
/// [`ArchetypeId`] requires.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArchetypeIdError {
    #[error("archetype id must not be empty")]
    Empty,
    #[error("archetype id '{0}' is missing a '.' separating kind from name")]
    MissingSeparator(String),
    #[error("archetype id '{0}' has kind '{1}', expected one of entry, exit, gate, overlay")]
    UnknownKind(String, String),
}

/// The role/kind an archetype (and therefore any card instantiated from it)
/// plays within a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Entry,
    Gate,
    Exit,
    Overlay,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Entry => "entry",
            Role::Gate => "gate",
            Role::Exit => "exit",
            Role::Overlay => "overlay",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(Role::Entry),
            "gate" => Some(Role::Gate),
            "exit" => Some(Role::Exit),
            "overlay" => Some(Role::Overlay),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stable archetype type identifier of the form `<kind>.<name>`, e.g.
/// `entry.trend_pullback`. `kind` is derived from the prefix, never stored
/// separately, so the two can never drift apart (spec.md §3 invariant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(transparent)]
pub struct ArchetypeId(String);

impl ArchetypeId {
    pub fn parse(s: impl Into<String>) -> Result<Self, ArchetypeIdError> {
        let s = s.into();
        if s.is_empty() {
            return Err(ArchetypeIdError::Empty);
        }
        let Some((kind, _name)) = s.split_once('.') else {
            return Err(ArchetypeIdError::MissingSeparator(s));
        };
        if Role::parse(kind).is_none() {
            return Err(ArchetypeIdError::UnknownKind(s, kind.to_string()));
        }
        Ok(Self(s))
    }

    /// Build an `ArchetypeId` without validating the kind prefix. Used when
    /// reading catalog data that a separate normalization pass already
    /// checked (see `compiler-core::catalog::normalize`).
    pub fn from_trusted(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `kind` prefix, e.g. `"entry"` for `entry.trend_pullback`.
    pub fn kind(&self) -> &str {
        self.0.split_once('.').map(|(k, _)| k).unwrap_or(&self.0)
    }

    pub fn role(&self) -> Option<Role> {
        Role::parse(self.kind())
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ArchetypeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// An ISO8601 UTC timestamp in `Z`-suffixed form, e.g.
/// `2026-07-28T12:00:00Z`. Stored as a string (not `chrono::DateTime`)
/// because it round-trips through the document store verbatim and is
/// compared for equality during revision-pin checks (spec.md §4.F) — a
/// string compare there is simpler and matches what the document store
/// actually persists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SlotTree
// =============================================================================

/// A validated slot tree: arbitrary JSON plus ergonomic accessors for the
/// fixed paths the compiler reads. Slot shapes are governed entirely by the
/// archetype's JSON Schema (`compiler-core::validator`); this type
/// deliberately does not attempt to model any archetype's slots as a
/// distinct Rust struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotTree(Value);

impl SlotTree {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn empty_object() -> Self {
        Self(Value::Object(Default::default()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Walk a dotted path (`"context.symbol"`) through nested objects.
    /// Returns `None` if any segment is missing or not an object.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// `context.symbol`, required by the compiler to compute data
    /// requirements and single-asset checks (spec.md §4.F).
    pub fn context_symbol(&self) -> Option<&str> {
        self.get_path("context.symbol").and_then(Value::as_str)
    }

    /// `context.tf` (timeframe), required alongside `context.symbol`.
    pub fn context_tf(&self) -> Option<&str> {
        self.get_path("context.tf").and_then(Value::as_str)
    }

    /// `event.lead_follow.follower_symbol`, used only by the
    /// `entry.intermarket_trigger` single-asset special case (spec.md §4.F.5).
    pub fn lead_follow_follower_symbol(&self) -> Option<&str> {
        self.get_path("event.lead_follow.follower_symbol")
            .and_then(Value::as_str)
    }

    /// The raw `event.condition` sub-tree, if present.
    pub fn event_condition(&self) -> Option<&Value> {
        self.get_path("event.condition")
    }

    /// The raw `event.regime` sub-tree, if present.
    pub fn event_regime(&self) -> Option<&Value> {
        self.get_path("event.regime")
    }

    /// The raw `action.execution` sub-tree, if present.
    pub fn action_execution(&self) -> Option<&Value> {
        self.get_path("action.execution")
    }

    /// The raw `action.sizing` sub-tree, if present.
    pub fn action_sizing(&self) -> Option<&Value> {
        self.get_path("action.sizing")
    }
}

impl From<Value> for SlotTree {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<SlotTree> for Value {
    fn from(tree: SlotTree) -> Self {
        tree.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn archetype_id_parses_kind() {
        let id = ArchetypeId::parse("entry.trend_pullback").unwrap();
        assert_eq!(id.kind(), "entry");
        assert_eq!(id.role(), Some(Role::Entry));
    }

    #[test]
    fn archetype_id_rejects_unknown_kind() {
        let err = ArchetypeId::parse("sizing.position_size").unwrap_err();
        assert!(matches!(err, ArchetypeIdError::UnknownKind(_, _)));
    }

    #[test]
    fn archetype_id_rejects_missing_separator() {
        let err = ArchetypeId::parse("trend_pullback").unwrap_err();
        assert!(matches!(err, ArchetypeIdError::MissingSeparator(_)));
    }

    #[test]
    fn slot_tree_reads_fixed_paths() {
        let tree = SlotTree::new(json!({
            "context": {"symbol": "BTC-USD", "tf": "1h"},
            "event": {"condition": {"type": "cross_above"}},
            "action": {"sizing": {"kind": "fixed_fraction"}},
        }));
        assert_eq!(tree.context_symbol(), Some("BTC-USD"));
        assert_eq!(tree.context_tf(), Some("1h"));
        assert!(tree.event_condition().is_some());
        assert!(tree.action_sizing().is_some());
        assert!(tree.action_execution().is_none());
    }

    #[test]
    fn card_id_round_trips_through_string() {
        let id = CardId::new();
        let s = id.to_string();
        let parsed: CardId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }
}

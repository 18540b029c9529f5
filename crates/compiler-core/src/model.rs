//! Data model (spec.md §3): archetypes, cards, strategies, and the ephemeral
//! outputs of the compiler. Grounded on `original_source/src/models/{archetype,
//! archetype_schema,card,strategy}.py`; slot and override payloads stay as
//! opaque [`SlotTree`] rather than per-archetype structs, per the design note
//! in spec.md §9 ("String-keyed dynamic slot maps").

use std::collections::BTreeMap;

use archetype_types::{ArchetypeId, CardId, Role, SlotTree, StrategyId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Archetype + ArchetypeSchema (immutable, catalog-owned)
// =============================================================================

/// Free-text authoring hints surfaced to agents browsing the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchetypeHints {
    #[serde(default)]
    pub when_to_use: Option<String>,
    #[serde(default)]
    pub common_pitfalls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archetype {
    pub id: ArchetypeId,
    pub version: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub required_slots: Vec<String>,
    pub schema_etag: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub hints: ArchetypeHints,
    pub updated_at: Timestamp,
}

impl Archetype {
    /// `kind` is derived from `id`'s prefix, never stored separately (spec.md
    /// §3 invariant).
    pub fn kind(&self) -> &str {
        self.id.kind()
    }

    pub fn role(&self) -> Option<Role> {
        self.id.role()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConstraints {
    #[serde(default)]
    pub min_history_bars: Option<u32>,
    #[serde(default)]
    pub pit_safe: Option<bool>,
    #[serde(default)]
    pub warmup_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaExample {
    pub human: String,
    pub slots: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeSchema {
    pub type_id: ArchetypeId,
    pub schema_version: String,
    pub etag: String,
    pub json_schema: Value,
    #[serde(default)]
    pub constraints: SchemaConstraints,
    /// Non-empty: every archetype in `list_archetypes` must have a schema
    /// with at least one example (spec.md §4.A invariant).
    pub examples: Vec<SchemaExample>,
    #[serde(default)]
    pub slot_hints: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub updated_at: Timestamp,
}

impl ArchetypeSchema {
    pub fn min_history_bars(&self) -> u32 {
        self.constraints.min_history_bars.unwrap_or(100)
    }
}

// =============================================================================
// Card (mutable, persisted)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    #[serde(rename = "type")]
    pub type_id: ArchetypeId,
    pub slots: SlotTree,
    /// The schema etag at the time these slots were last validated
    /// (spec.md §3 invariant).
    pub schema_etag: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// =============================================================================
// Attachment (value object embedded in Strategy)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub card_id: CardId,
    pub role: Role,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_overrides")]
    pub overrides: Value,
    #[serde(default)]
    pub follow_latest: bool,
    /// Present iff `follow_latest == false`; the card's `updated_at` captured
    /// at attach time (spec.md §3 invariant).
    #[serde(default)]
    pub card_revision_id: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_overrides() -> Value {
    Value::Object(Default::default())
}

// =============================================================================
// Strategy (mutable, persisted)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    Draft,
    Ready,
    Running,
    Paused,
    Stopped,
    Error,
}

impl StrategyStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "ready" => Some(Self::Ready),
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "stopped" => Some(Self::Stopped),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub name: String,
    pub status: StrategyStatus,
    #[serde(default)]
    pub universe: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub version: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// =============================================================================
// Ephemeral compiler outputs (never persisted)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl Issue {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
            path: None,
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledCard {
    pub role: Role,
    pub card_id: CardId,
    pub card_revision_id: String,
    #[serde(rename = "type")]
    pub type_id: ArchetypeId,
    pub effective_slots: Value,
    #[serde(default)]
    pub compiled_condition: Option<Value>,
    #[serde(default)]
    pub execution_spec: Option<Value>,
    #[serde(default)]
    pub sizing_spec: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRequirement {
    pub symbol: String,
    pub tf: String,
    pub min_bars: u32,
    pub lookback_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledStrategy {
    pub strategy_id: StrategyId,
    pub cards: Vec<CompiledCard>,
    pub data_requirements: Vec<DataRequirement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusHint {
    Ready,
    FixRequired,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub errors: usize,
    pub warnings: usize,
    pub cards_validated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub status_hint: StatusHint,
    #[serde(default)]
    pub compiled: Option<CompiledStrategy>,
    pub issues: Vec<Issue>,
    pub validation_summary: ValidationSummary,
}

//! Tool/API facade logic (component H), minus transport framing.
//!
//! spec.md §4.H describes this as "thin": validate argument shapes, call
//! B/F/A, convert structured errors. The one real rule it owns is
//! auto-inference — `role` from `type`'s prefix when absent on `add_card`,
//! and `schema_etag` stamped from the *current* catalog schema rather than
//! trusted from the caller — so it lives here as a single `StrategyService`
//! rather than being duplicated across the MCP and HTTP entrypoints in
//! `services/strategy-api`. Per spec.md §9, per-tool inline closures
//! capturing mutable repository handles are replaced by this explicit
//! service struct, wired once at startup.

use std::sync::Arc;

use archetype_types::{ArchetypeId, CardId, Role, SlotTree, StrategyId, Timestamp};
use serde::Serialize;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::compiler::Compiler;
use crate::errors::{ToolError, ToolResult};
use crate::model::{
    Archetype, Attachment, Card, CompileResult, Strategy, StrategyStatus,
};
use crate::store::{CardStore, StrategyStore};

pub struct StrategyService {
    catalog: Arc<Catalog>,
    cards: Arc<dyn CardStore>,
    strategies: Arc<dyn StrategyStore>,
    compiler: Compiler,
}

// =============================================================================
// Response DTOs, grounded on original_source/src/tools/{trading,strategy}_tools.py
// =============================================================================

#[derive(Debug, Serialize)]
pub struct GetArchetypesResponse {
    pub types: Vec<Archetype>,
    pub as_of: String,
}

#[derive(Debug, Serialize)]
pub struct GetArchetypeSchemaResponse {
    pub type_id: String,
    pub schema_version: String,
    pub etag: String,
    pub json_schema: Value,
    pub constraints: crate::model::SchemaConstraints,
    pub slot_hints: std::collections::BTreeMap<String, String>,
    pub examples: Vec<crate::model::SchemaExample>,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct GetSchemaExampleResponse {
    pub type_id: String,
    pub example_slots: Value,
    pub human_description: Option<String>,
    pub schema_etag: String,
}

#[derive(Debug, Serialize)]
pub struct CardSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub type_id: String,
    pub slots: Value,
    pub schema_etag: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Card> for CardSummary {
    fn from(card: Card) -> Self {
        Self {
            id: card.id.to_string(),
            type_id: card.type_id.to_string(),
            slots: card.slots.into_value(),
            schema_etag: card.schema_etag,
            created_at: card.created_at.to_string(),
            updated_at: card.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateSlotsResponse {
    pub type_id: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub schema_etag: String,
}

#[derive(Debug, Serialize)]
pub struct StrategySummary {
    pub id: String,
    pub owner_id: Option<String>,
    pub thread_id: Option<String>,
    pub name: String,
    pub status: String,
    pub universe: Vec<String>,
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Strategy> for StrategySummary {
    fn from(s: &Strategy) -> Self {
        Self {
            id: s.id.to_string(),
            owner_id: s.owner_id.clone(),
            thread_id: s.thread_id.clone(),
            name: s.name.clone(),
            status: s.status.as_str().to_string(),
            universe: s.universe.clone(),
            version: s.version,
            created_at: s.created_at.to_string(),
            updated_at: s.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetStrategyResponse {
    pub strategy: StrategySummary,
    pub cards: Vec<AttachedCardView>,
    pub card_count: usize,
}

#[derive(Debug, Serialize)]
pub struct AttachedCardView {
    pub card_id: String,
    pub role: String,
    pub enabled: bool,
    pub overrides: Value,
    pub follow_latest: bool,
    pub card_revision_id: Option<String>,
    #[serde(rename = "type")]
    pub type_id: Option<String>,
    pub slots: Option<Value>,
}

impl StrategyService {
    pub fn new(catalog: Arc<Catalog>, cards: Arc<dyn CardStore>, strategies: Arc<dyn StrategyStore>) -> Self {
        let compiler = Compiler::new(catalog.clone(), cards.clone(), strategies.clone());
        Self {
            catalog,
            cards,
            strategies,
            compiler,
        }
    }

    // -------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------

    pub fn get_archetypes(&self, kind: Option<&str>) -> ToolResult<GetArchetypesResponse> {
        let types = self.catalog.list_archetypes(kind)?;
        Ok(GetArchetypesResponse {
            types,
            as_of: Timestamp::now().to_string(),
        })
    }

    pub fn get_archetype_schema(
        &self,
        type_id_str: &str,
        _if_none_match: Option<&str>,
    ) -> ToolResult<GetArchetypeSchemaResponse> {
        let type_id = parse_archetype_id(type_id_str)?;
        let schema = self
            .catalog
            .get_schema(&type_id)
            .ok_or_else(|| ToolError::schema_not_found(type_id_str))?;
        // The etag round-trips regardless of if_none_match: the underlying
        // transport does not express a 304 here (spec.md §4.A).
        Ok(GetArchetypeSchemaResponse {
            type_id: schema.type_id.to_string(),
            schema_version: schema.schema_version.clone(),
            etag: schema.etag.clone(),
            json_schema: self.catalog.resolve_schema_refs(&schema.json_schema),
            constraints: schema.constraints.clone(),
            slot_hints: schema.slot_hints.clone(),
            examples: schema.examples.clone(),
            updated_at: schema.updated_at.to_string(),
        })
    }

    pub fn get_schema_example(&self, type_id_str: &str, index: usize) -> ToolResult<GetSchemaExampleResponse> {
        let type_id = parse_archetype_id(type_id_str)?;
        let schema = self
            .catalog
            .get_schema(&type_id)
            .ok_or_else(|| ToolError::schema_not_found(type_id_str))?;
        let example = self
            .catalog
            .get_example(&type_id, index)
            .ok_or_else(|| ToolError::validation_error(format!("no example at index {index} for {type_id_str}")))?;
        Ok(GetSchemaExampleResponse {
            type_id: type_id.to_string(),
            example_slots: example.slots.clone(),
            human_description: Some(example.human.clone()),
            schema_etag: schema.etag.clone(),
        })
    }

    /// Supplemental browsing tools (spec.md §9's catalog-browsing addition,
    /// see SPEC_FULL.md §3): same data as the catalog getters, shaped for an
    /// agent skimming the catalog rather than fetching one type precisely.
    pub fn browse_archetypes(&self, kind: Option<&str>) -> ToolResult<Vec<Archetype>> {
        self.catalog.list_archetypes(kind)
    }

    pub fn browse_archetype_schemas(&self, kind: Option<&str>) -> ToolResult<Vec<GetArchetypeSchemaResponse>> {
        let archetypes = self.catalog.list_archetypes(kind)?;
        archetypes
            .iter()
            .map(|a| self.get_archetype_schema(a.id.as_str(), None))
            .collect()
    }

    // -------------------------------------------------------------------
    // Cards
    // -------------------------------------------------------------------

    fn validate_or_err(&self, type_id: &ArchetypeId, slots: &Value) -> ToolResult<String> {
        let schema = self
            .catalog
            .get_schema(type_id)
            .ok_or_else(|| ToolError::schema_not_found(type_id.as_str()))?;
        let errors = self.catalog.validator().validate(&schema.json_schema, slots);
        if !errors.is_empty() {
            return Err(ToolError::schema_validation_error(
                type_id.as_str(),
                errors.into_iter().map(|e| e.to_string()).collect(),
            ));
        }
        Ok(schema.etag.clone())
    }

    pub async fn validate_slots_draft(&self, type_id_str: &str, slots: Value) -> ToolResult<ValidateSlotsResponse> {
        let type_id = parse_archetype_id(type_id_str)?;
        let schema = self
            .catalog
            .get_schema(&type_id)
            .ok_or_else(|| ToolError::schema_not_found(type_id_str))?;
        let errors = self.catalog.validator().validate(&schema.json_schema, &slots);
        Ok(ValidateSlotsResponse {
            type_id: type_id.to_string(),
            valid: errors.is_empty(),
            errors: errors.into_iter().map(|e| e.to_string()).collect(),
            schema_etag: schema.etag.clone(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_card(
        &self,
        type_id_str: &str,
        slots: Value,
        strategy_id: Option<&str>,
        role: Option<&str>,
        overrides: Option<Value>,
        follow_latest: bool,
        enabled: bool,
    ) -> ToolResult<CardSummary> {
        let type_id = parse_archetype_id(type_id_str)?;
        // The facade never trusts a client-supplied etag for writes; it
        // always stamps the current schema's etag (spec.md §4.H).
        let schema_etag = self.validate_or_err(&type_id, &slots)?;

        let card = Card {
            id: CardId::new(),
            type_id: type_id.clone(),
            slots: SlotTree::new(slots),
            schema_etag,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };
        let card = self
            .cards
            .create(card)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;

        if let Some(strategy_id_str) = strategy_id {
            let role = resolve_role(role, &type_id)?;
            self.attach_card(strategy_id_str, card.id, role, overrides, follow_latest, enabled)
                .await?;
        }

        Ok(card.into())
    }

    pub async fn get_card(&self, card_id_str: &str) -> ToolResult<CardSummary> {
        let card_id = parse_card_id(card_id_str)?;
        let card = self
            .cards
            .get(&card_id)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?
            .ok_or_else(|| ToolError::card_not_found(card_id_str))?;
        Ok(card.into())
    }

    pub async fn list_cards(&self) -> ToolResult<Vec<CardSummary>> {
        let cards = self
            .cards
            .list()
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;
        Ok(cards.into_iter().map(CardSummary::from).collect())
    }

    pub async fn update_card(&self, card_id_str: &str, slots: Value) -> ToolResult<CardSummary> {
        let card_id = parse_card_id(card_id_str)?;
        let mut existing = self
            .cards
            .get(&card_id)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?
            .ok_or_else(|| ToolError::card_not_found(card_id_str))?;

        let schema_etag = self.validate_or_err(&existing.type_id, &slots)?;
        existing.slots = SlotTree::new(slots);
        existing.schema_etag = schema_etag;

        let updated = self
            .cards
            .update(existing)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;
        Ok(updated.into())
    }

    pub async fn delete_card(&self, card_id_str: &str) -> ToolResult<()> {
        let card_id = parse_card_id(card_id_str)?;
        self.cards.delete(&card_id).await.map_err(|e| match e {
            crate::store::StoreError::NotFound => ToolError::card_not_found(card_id_str),
            other => ToolError::database_error(other.to_string()),
        })
    }

    // -------------------------------------------------------------------
    // Strategies
    // -------------------------------------------------------------------

    pub async fn create_strategy(
        &self,
        name: &str,
        owner_id: Option<&str>,
        thread_id: Option<&str>,
        universe: Vec<String>,
    ) -> ToolResult<StrategySummary> {
        let strategy = Strategy {
            id: StrategyId::new(),
            owner_id: owner_id.map(str::to_string),
            thread_id: thread_id.map(str::to_string),
            name: name.to_string(),
            status: StrategyStatus::Draft,
            universe,
            attachments: Vec::new(),
            version: 0,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };
        let strategy = self
            .strategies
            .create(strategy)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;
        Ok((&strategy).into())
    }

    pub async fn get_strategy(&self, strategy_id_str: &str) -> ToolResult<GetStrategyResponse> {
        let strategy_id = parse_strategy_id(strategy_id_str)?;
        let strategy = self
            .strategies
            .get(&strategy_id)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?
            .ok_or_else(|| ToolError::strategy_not_found(strategy_id_str))?;

        let mut views = Vec::with_capacity(strategy.attachments.len());
        for attachment in &strategy.attachments {
            let card = self
                .cards
                .get(&attachment.card_id)
                .await
                .map_err(|e| ToolError::database_error(e.to_string()))?;
            views.push(AttachedCardView {
                card_id: attachment.card_id.to_string(),
                role: attachment.role.to_string(),
                enabled: attachment.enabled,
                overrides: attachment.overrides.clone(),
                follow_latest: attachment.follow_latest,
                card_revision_id: attachment.card_revision_id.clone(),
                type_id: card.as_ref().map(|c| c.type_id.to_string()),
                slots: card.map(|c| c.slots.into_value()),
            });
        }

        Ok(GetStrategyResponse {
            card_count: views.len(),
            cards: views,
            strategy: (&strategy).into(),
        })
    }

    pub async fn list_strategies(&self) -> ToolResult<Vec<StrategySummary>> {
        let strategies = self
            .strategies
            .list()
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;
        Ok(strategies.iter().map(StrategySummary::from).collect())
    }

    pub async fn update_strategy_meta(
        &self,
        strategy_id_str: &str,
        name: Option<&str>,
        status: Option<&str>,
        universe: Option<Vec<String>>,
    ) -> ToolResult<StrategySummary> {
        let strategy_id = parse_strategy_id(strategy_id_str)?;
        let mut strategy = self
            .strategies
            .get(&strategy_id)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?
            .ok_or_else(|| ToolError::strategy_not_found(strategy_id_str))?;

        if let Some(name) = name {
            strategy.name = name.to_string();
        }
        if let Some(status) = status {
            strategy.status = StrategyStatus::parse(status).ok_or_else(|| ToolError::invalid_status(status))?;
        }
        if let Some(universe) = universe {
            strategy.universe = universe;
        }

        let updated = self
            .strategies
            .update(strategy)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;
        Ok((&updated).into())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_card(
        &self,
        strategy_id_str: &str,
        type_id_str: &str,
        slots: Value,
        role: Option<&str>,
        overrides: Option<Value>,
        follow_latest: bool,
        enabled: bool,
    ) -> ToolResult<StrategySummary> {
        let type_id = parse_archetype_id(type_id_str)?;
        let schema_etag = self.validate_or_err(&type_id, &slots)?;
        let role = resolve_role(role, &type_id)?;

        let card = Card {
            id: CardId::new(),
            type_id: type_id.clone(),
            slots: SlotTree::new(slots),
            schema_etag,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };
        let card = self
            .cards
            .create(card)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;

        self.attach_card(strategy_id_str, card.id, role, overrides, follow_latest, enabled)
            .await
    }

    async fn attach_card(
        &self,
        strategy_id_str: &str,
        card_id: CardId,
        role: Role,
        overrides: Option<Value>,
        follow_latest: bool,
        enabled: bool,
    ) -> ToolResult<StrategySummary> {
        let strategy_id = parse_strategy_id(strategy_id_str)?;
        let mut strategy = self
            .strategies
            .get(&strategy_id)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?
            .ok_or_else(|| ToolError::strategy_not_found(strategy_id_str))?;

        if strategy.attachments.iter().any(|a| a.card_id == card_id) {
            return Err(ToolError::duplicate_attachment(&card_id.to_string()));
        }

        let card_revision_id = if follow_latest {
            None
        } else {
            let card = self
                .cards
                .get(&card_id)
                .await
                .map_err(|e| ToolError::database_error(e.to_string()))?
                .ok_or_else(|| ToolError::card_not_found(&card_id.to_string()))?;
            Some(card.updated_at.to_string())
        };

        strategy.attachments.push(Attachment {
            card_id,
            role,
            enabled,
            overrides: overrides.unwrap_or_else(|| Value::Object(Default::default())),
            follow_latest,
            card_revision_id,
        });

        let updated = self
            .strategies
            .update(strategy)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?;
        Ok((&updated).into())
    }

    // -------------------------------------------------------------------
    // Compilation
    // -------------------------------------------------------------------

    pub async fn validate_strategy(&self, strategy_id_str: &str) -> ToolResult<CompileResult> {
        let strategy_id = parse_strategy_id(strategy_id_str)?;
        self.compiler.validate_strategy(&strategy_id).await
    }

    pub async fn compile_strategy(&self, strategy_id_str: &str) -> ToolResult<CompileResult> {
        let strategy_id = parse_strategy_id(strategy_id_str)?;
        self.compiler.compile_strategy(&strategy_id).await
    }
}

fn parse_archetype_id(s: &str) -> ToolResult<ArchetypeId> {
    ArchetypeId::parse(s).map_err(|e| ToolError::validation_error(e.to_string()))
}

fn parse_card_id(s: &str) -> ToolResult<CardId> {
    CardId::parse(s).map_err(|e| ToolError::validation_error(format!("invalid card id '{s}': {e}")))
}

fn parse_strategy_id(s: &str) -> ToolResult<StrategyId> {
    StrategyId::parse(s).map_err(|e| ToolError::validation_error(format!("invalid strategy id '{s}': {e}")))
}

/// Auto-infers `role` from `type`'s `<kind>.<name>` prefix when absent
/// (spec.md §4.H); rejects any role outside the four-role set spec.md §9
/// commits to.
fn resolve_role(role: Option<&str>, type_id: &ArchetypeId) -> ToolResult<Role> {
    match role {
        Some(role_str) => Role::parse(role_str).ok_or_else(|| ToolError::invalid_role(role_str)),
        None => type_id
            .role()
            .ok_or_else(|| ToolError::invalid_role(type_id.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::store::memory::{InMemoryCardStore, InMemoryStrategyStore};
    use std::path::PathBuf;

    fn catalog_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../catalog")
    }

    fn service() -> StrategyService {
        let catalog = Arc::new(Catalog::load_from_dir(catalog_dir()).expect("catalog loads"));
        StrategyService::new(
            catalog,
            Arc::new(InMemoryCardStore::default()),
            Arc::new(InMemoryStrategyStore::default()),
        )
    }

    #[tokio::test]
    async fn role_is_inferred_from_type_prefix() {
        let svc = service();
        let strategy = svc
            .create_strategy("S", None, None, vec!["BTC-USD".to_string()])
            .await
            .unwrap();
        let example = svc
            .get_schema_example("entry.trend_pullback", 0)
            .unwrap()
            .example_slots;
        let updated = svc
            .add_card(&strategy.id, "entry.trend_pullback", example, None, None, true, true)
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn invalid_role_is_rejected() {
        let svc = service();
        let strategy = svc
            .create_strategy("S", None, None, vec!["BTC-USD".to_string()])
            .await
            .unwrap();
        let example = svc
            .get_schema_example("entry.trend_pullback", 0)
            .unwrap()
            .example_slots;
        let result = svc
            .add_card(
                &strategy.id,
                "entry.trend_pullback",
                example,
                Some("sizing"),
                None,
                true,
                true,
            )
            .await;
        assert!(result.is_err());
    }
}

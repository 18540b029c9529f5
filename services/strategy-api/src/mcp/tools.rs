//! MCP tool implementations (component H, spec.md §6 "Tool surface").
//!
//! One tool per operation spec.md §6 lists, plus the two catalog-browsing
//! tools SPEC_FULL.md §3 adds. Every tool is a thin wrapper: deserialize
//! args (mcp-attr does this from the declared parameter types), call
//! [`StrategyService`], serialize the response to a pretty JSON string.
//! Grounded on `familiar-core::mcp::tools::SchemaTools`'s `#[mcp_server]`
//! style — one struct holding shared state behind an `Arc`, tool methods
//! returning `mcp_attr::Result<String>` via `serde_json::to_string_pretty`.

use std::sync::Arc;

use compiler_core::StrategyService;
use mcp_attr::server::{mcp_server, McpServer};
use mcp_attr::Result;
use serde_json::Value;

pub struct StrategyTools {
    service: Arc<StrategyService>,
}

impl StrategyTools {
    pub fn new(service: Arc<StrategyService>) -> Self {
        Self { service }
    }
}

#[mcp_server]
impl McpServer for StrategyTools {
    // ========================================================================
    // Catalog (component A)
    // ========================================================================

    /// List archetypes, optionally filtered by kind (entry|exit|gate|overlay).
    /// Deprecated archetypes are filtered out.
    #[tool]
    async fn get_archetypes(&self, kind: Option<String>) -> Result<String> {
        let response = self.service.get_archetypes(kind.as_deref())?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Fetch an archetype's JSON-Schema-draft-07 document with external
    /// `$ref`s already resolvable against the common-definitions pool.
    /// `if_none_match` round-trips the etag but the full schema is always
    /// returned (this transport has no 304).
    #[tool]
    async fn get_archetype_schema(&self, r#type: String, if_none_match: Option<String>) -> Result<String> {
        let response = self.service.get_archetype_schema(&r#type, if_none_match.as_deref())?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Fetch one worked example of valid slots for an archetype.
    #[tool]
    async fn get_schema_example(&self, r#type: String, example_index: Option<usize>) -> Result<String> {
        let response = self
            .service
            .get_schema_example(&r#type, example_index.unwrap_or(0))?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Browse all non-deprecated archetypes, optionally filtered by kind.
    /// Same data as `get_archetypes`, shaped for an agent skimming the
    /// catalog (SPEC_FULL.md §3).
    #[tool]
    async fn browse_archetypes(&self, kind: Option<String>) -> Result<String> {
        let archetypes = self.service.browse_archetypes(kind.as_deref())?;
        Ok(serde_json::to_string_pretty(&archetypes)?)
    }

    /// Browse every archetype's full schema, optionally filtered by kind
    /// (SPEC_FULL.md §3).
    #[tool]
    async fn browse_archetype_schemas(&self, kind: Option<String>) -> Result<String> {
        let schemas = self.service.browse_archetype_schemas(kind.as_deref())?;
        Ok(serde_json::to_string_pretty(&schemas)?)
    }

    // ========================================================================
    // Cards (component B)
    // ========================================================================

    /// Validate a slot tree against an archetype's schema without persisting
    /// a card. `valid` iff `create_card` with the same args would not emit a
    /// `SCHEMA_VALIDATION_ERROR` (spec.md §8).
    #[tool]
    async fn validate_slots_draft(&self, r#type: String, slots: Value) -> Result<String> {
        let response = self.service.validate_slots_draft(&r#type, slots).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Create a card instantiating `type` with `slots`. If `strategy_id` is
    /// given, also attaches it to that strategy with `role` (auto-inferred
    /// from `type`'s prefix when absent) — a composite operation, same as
    /// `add_card`.
    #[tool]
    #[allow(clippy::too_many_arguments)]
    async fn create_card(
        &self,
        r#type: String,
        slots: Value,
        strategy_id: Option<String>,
        role: Option<String>,
        overrides: Option<Value>,
        follow_latest: Option<bool>,
        enabled: Option<bool>,
    ) -> Result<String> {
        let response = self
            .service
            .create_card(
                &r#type,
                slots,
                strategy_id.as_deref(),
                role.as_deref(),
                overrides,
                follow_latest.unwrap_or(false),
                enabled.unwrap_or(true),
            )
            .await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Fetch a card by id.
    #[tool]
    async fn get_card(&self, card_id: String) -> Result<String> {
        let response = self.service.get_card(&card_id).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// List every card.
    #[tool]
    async fn list_cards(&self) -> Result<String> {
        let response = self.service.list_cards().await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Replace a card's slots, re-validating and re-stamping `schema_etag`
    /// against the current schema.
    #[tool]
    async fn update_card(&self, card_id: String, slots: Value) -> Result<String> {
        let response = self.service.update_card(&card_id, slots).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Delete a card. Does not cascade: strategies still attaching it will
    /// see `CARD_NOT_FOUND` at their next compile (spec.md §3).
    #[tool]
    async fn delete_card(&self, card_id: String) -> Result<String> {
        self.service.delete_card(&card_id).await?;
        Ok(serde_json::to_string_pretty(&serde_json::json!({"deleted": card_id}))?)
    }

    // ========================================================================
    // Strategies (component B) + compilation (component F)
    // ========================================================================

    /// Create a strategy in `draft` status with an empty attachment list.
    #[tool]
    async fn create_strategy(
        &self,
        name: String,
        owner_id: Option<String>,
        thread_id: Option<String>,
        universe: Option<Vec<String>>,
    ) -> Result<String> {
        let response = self
            .service
            .create_strategy(&name, owner_id.as_deref(), thread_id.as_deref(), universe.unwrap_or_default())
            .await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Fetch a strategy with its attached cards resolved.
    #[tool]
    async fn get_strategy(&self, strategy_id: String) -> Result<String> {
        let response = self.service.get_strategy(&strategy_id).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// List every strategy.
    #[tool]
    async fn list_strategies(&self) -> Result<String> {
        let response = self.service.list_strategies().await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Update a strategy's name, status, and/or universe. Every call
    /// increments `version` by 1 (spec.md §8 invariant).
    #[tool]
    async fn update_strategy_meta(
        &self,
        strategy_id: String,
        name: Option<String>,
        status: Option<String>,
        universe: Option<Vec<String>>,
    ) -> Result<String> {
        let response = self
            .service
            .update_strategy_meta(&strategy_id, name.as_deref(), status.as_deref(), universe)
            .await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Composite: create a card instantiating `type` with `slots`, then
    /// attach it to `strategy_id` with `role` (auto-inferred from `type`'s
    /// prefix when absent).
    #[tool]
    #[allow(clippy::too_many_arguments)]
    async fn add_card(
        &self,
        strategy_id: String,
        r#type: String,
        slots: Value,
        role: Option<String>,
        overrides: Option<Value>,
        follow_latest: Option<bool>,
        enabled: Option<bool>,
    ) -> Result<String> {
        let response = self
            .service
            .add_card(
                &strategy_id,
                &r#type,
                slots,
                role.as_deref(),
                overrides,
                follow_latest.unwrap_or(false),
                enabled.unwrap_or(true),
            )
            .await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Run the compilation pipeline without emitting a plan: same issues and
    /// `validation_summary` `compile_strategy` would produce, `compiled`
    /// always `null` (spec.md §9).
    #[tool]
    async fn validate_strategy(&self, strategy_id: String) -> Result<String> {
        let response = self.service.validate_strategy(&strategy_id).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }

    /// Resolve, merge, validate, and compose a strategy's attachments into a
    /// runnable `CompiledStrategy`, or an issue list explaining why it
    /// cannot run yet (spec.md §4.F).
    #[tool]
    async fn compile_strategy(&self, strategy_id: String) -> Result<String> {
        let response = self.service.compile_strategy(&strategy_id).await?;
        Ok(serde_json::to_string_pretty(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compiler_core::catalog::Catalog;
    use compiler_core::store::memory::{InMemoryCardStore, InMemoryStrategyStore};
    use std::path::PathBuf;

    fn catalog_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../catalog")
    }

    fn tools() -> StrategyTools {
        let catalog = Arc::new(Catalog::load_from_dir(catalog_dir()).expect("catalog loads"));
        let service = Arc::new(StrategyService::new(
            catalog,
            Arc::new(InMemoryCardStore::default()),
            Arc::new(InMemoryStrategyStore::default()),
        ));
        StrategyTools::new(service)
    }

    #[tokio::test]
    async fn get_archetypes_round_trips_through_service() {
        let tools = tools();
        let response = tools.service.get_archetypes(None).unwrap();
        assert!(!response.types.is_empty());
    }
}

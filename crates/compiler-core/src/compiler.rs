//! Compiler (component F): turns a Strategy into a `CompiledStrategy` or an
//! issue list. Orchestrates B (stores) → D (merge) → C (validator) → E
//! (sub-spec extraction), then runs composition and single-asset checks and
//! flattens data requirements. Grounded on spec.md §4.F's numbered algorithm;
//! this is deliberately a single, sequential, non-fan-out pass over
//! attachments in list order (spec.md §5 ordering guarantees).

use std::collections::HashMap;
use std::sync::Arc;

use archetype_types::{ArchetypeId, Role, SlotTree};
use tracing::warn;

use crate::catalog::Catalog;
use crate::errors::{ErrorCode, ToolError};
use crate::extract;
use crate::merge::merge;
use crate::model::{
    CompileResult, CompiledCard, CompiledStrategy, DataRequirement, Issue, Severity, StatusHint,
    Strategy, ValidationSummary,
};
use crate::store::{CardStore, StrategyStore};

pub struct Compiler {
    catalog: Arc<Catalog>,
    cards: Arc<dyn CardStore>,
    strategies: Arc<dyn StrategyStore>,
}

impl Compiler {
    pub fn new(catalog: Arc<Catalog>, cards: Arc<dyn CardStore>, strategies: Arc<dyn StrategyStore>) -> Self {
        Self {
            catalog,
            cards,
            strategies,
        }
    }

    /// `compile_strategy(id)`: emits `compiled` when `status_hint == ready`.
    pub async fn compile_strategy(&self, strategy_id: &archetype_types::StrategyId) -> Result<CompileResult, ToolError> {
        self.run(strategy_id, true).await
    }

    /// `validate_strategy(id)`: identical pipeline, `compiled` always `null`
    /// (spec.md §9 open question — same pipeline, field suppressed).
    pub async fn validate_strategy(&self, strategy_id: &archetype_types::StrategyId) -> Result<CompileResult, ToolError> {
        self.run(strategy_id, false).await
    }

    async fn run(&self, strategy_id: &archetype_types::StrategyId, emit_compiled: bool) -> Result<CompileResult, ToolError> {
        // Step 1: load strategy via B. Absence here is a direct lookup, so it
        // raises rather than downgrading to an issue (spec.md §7).
        let strategy = self
            .strategies
            .get(strategy_id)
            .await
            .map_err(|e| ToolError::database_error(e.to_string()))?
            .ok_or_else(|| ToolError::strategy_not_found(&strategy_id.to_string()))?;

        let mut issues = Vec::new();
        let mut compiled_cards = Vec::new();
        let mut data_requirements: HashMap<(String, String), u32> = HashMap::new();
        let mut cards_validated = 0usize;

        for attachment in &strategy.attachments {
            if !attachment.enabled {
                continue;
            }

            // Step 2b: card resolution + revision pinning.
            let card_id_str = attachment.card_id.to_string();
            let card = match self.cards.get(&attachment.card_id).await {
                Ok(card) => card,
                Err(e) => {
                    warn!(error = %e, card_id = %card_id_str, "store error resolving card");
                    issues.push(
                        Issue::error("CARD_NOT_FOUND", format!("Card not found: {card_id_str}"))
                            .with_path(format!("attachments[{card_id_str}]")),
                    );
                    continue;
                }
            };

            let card = if attachment.follow_latest {
                match card {
                    Some(card) => card,
                    None => {
                        issues.push(
                            Issue::error("CARD_NOT_FOUND", format!("Card not found: {card_id_str}"))
                                .with_path(format!("attachments[{card_id_str}]")),
                        );
                        continue;
                    }
                }
            } else {
                match card {
                    Some(card) if Some(card.updated_at.as_str()) == attachment.card_revision_id.as_deref() => card,
                    _ => {
                        issues.push(
                            Issue::error(
                                "CARD_REVISION_NOT_FOUND",
                                format!("Card revision not found or stale: {card_id_str}"),
                            )
                            .with_path(format!("attachments[{card_id_str}]")),
                        );
                        continue;
                    }
                }
            };
            let card_revision_id = card.updated_at.as_str().to_string();

            // Step 2c: effective slots.
            let effective_slots = merge(card.slots.as_value(), &attachment.overrides);

            // Step 2d: schema lookup.
            let schema = match self.catalog.get_schema(&card.type_id) {
                Some(schema) => schema,
                None => {
                    issues.push(
                        Issue::error("SCHEMA_NOT_FOUND", format!("No schema for archetype: {}", card.type_id))
                            .with_path(format!("attachments[{card_id_str}]")),
                    );
                    continue;
                }
            };

            // Step 2e: re-validation.
            cards_validated += 1;
            let validation_errors = self.catalog.validator().validate(&schema.json_schema, &effective_slots);
            if !validation_errors.is_empty() {
                for err in validation_errors {
                    issues.push(
                        Issue::error("SLOT_VALIDATION_ERROR", err.message)
                            .with_path(format!("attachments[{card_id_str}].effective_slots")),
                    );
                }
                continue;
            }

            // Step 2f: context extraction.
            let slot_tree = SlotTree::new(effective_slots.clone());
            let (symbol, tf) = match (slot_tree.context_symbol(), slot_tree.context_tf()) {
                (Some(symbol), Some(tf)) => (symbol.to_string(), tf.to_string()),
                _ => {
                    issues.push(
                        Issue::error("MISSING_CONTEXT", "effective_slots is missing context.symbol or context.tf")
                            .with_path(format!("attachments[{card_id_str}].effective_slots")),
                    );
                    continue;
                }
            };

            // Step 2g: data requirement.
            let min_bars = schema.min_history_bars();
            data_requirements
                .entry((symbol, tf))
                .and_modify(|existing| *existing = (*existing).max(min_bars))
                .or_insert(min_bars);

            // Step 2h: sub-specs.
            let compiled_condition = extract::compiled_condition(&effective_slots);
            let execution_spec = extract::execution_spec(&effective_slots);
            let sizing_spec = extract::sizing_spec(&effective_slots);

            // Step 2i.
            compiled_cards.push(CompiledCard {
                role: attachment.role,
                card_id: attachment.card_id,
                card_revision_id,
                type_id: card.type_id.clone(),
                effective_slots,
                compiled_condition,
                execution_spec,
                sizing_spec,
            });
        }

        // Step 3: universe check.
        if strategy.universe.is_empty() {
            issues.push(Issue::error("EMPTY_UNIVERSE", "strategy.universe is empty"));
        }

        // Step 4: composition checks.
        let entry_count = compiled_cards.iter().filter(|c| c.role == Role::Entry).count();
        let exit_count = compiled_cards.iter().filter(|c| c.role == Role::Exit).count();
        if entry_count == 0 {
            issues.push(Issue::error("NO_ENTRIES", "strategy has no enabled, valid entry cards"));
        }
        if exit_count == 0 {
            issues.push(Issue::warning("NO_EXITS", "strategy has no enabled, valid exit cards"));
        }
        if exit_count > 1 {
            issues.push(Issue::warning("MULTIPLE_EXITS", format!("strategy has {exit_count} exit cards")));
        }

        // Step 5: single-asset invariant.
        single_asset_check(&compiled_cards, &strategy, &mut issues);

        // Step 6: data-requirement flattening.
        let mut data_requirements: Vec<DataRequirement> = data_requirements
            .into_iter()
            .map(|((symbol, tf), min_bars)| {
                let lookback_hours = min_bars as f64 * hours_per_bar(&tf);
                DataRequirement {
                    symbol,
                    tf,
                    min_bars,
                    lookback_hours,
                }
            })
            .collect();
        data_requirements.sort_by(|a, b| (a.symbol.as_str(), a.tf.as_str()).cmp(&(b.symbol.as_str(), b.tf.as_str())));

        let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
        let warnings = issues.iter().filter(|i| i.severity == Severity::Warning).count();

        // Step 7: status hint.
        let status_hint = if errors == 0 { StatusHint::Ready } else { StatusHint::FixRequired };
        let compiled = if status_hint == StatusHint::Ready && emit_compiled {
            Some(CompiledStrategy {
                strategy_id: strategy.id,
                cards: compiled_cards,
                data_requirements,
            })
        } else {
            None
        };

        Ok(CompileResult {
            status_hint,
            compiled,
            issues,
            validation_summary: ValidationSummary {
                errors,
                warnings,
                cards_validated,
            },
        })
    }
}

const INTERMARKET_TRIGGER: &str = "entry.intermarket_trigger";

fn single_asset_check(compiled_cards: &[CompiledCard], strategy: &Strategy, issues: &mut Vec<Issue>) {
    let mut traded_symbols: Vec<String> = Vec::new();

    for card in compiled_cards.iter().filter(|c| c.role == Role::Entry) {
        let slot_tree = SlotTree::new(card.effective_slots.clone());
        let context_symbol = slot_tree.context_symbol().unwrap_or_default().to_string();

        let traded_symbol = if card.type_id.as_str() == INTERMARKET_TRIGGER {
            let follower = slot_tree.lead_follow_follower_symbol().unwrap_or_default().to_string();
            if context_symbol != follower {
                issues.push(
                    Issue::error(
                        "MVP_SINGLE_ASSET_VIOLATION",
                        format!(
                            "entry.intermarket_trigger context.symbol '{context_symbol}' must equal event.lead_follow.follower_symbol '{follower}'"
                        ),
                    )
                    .with_path(format!("attachments[{}].effective_slots", card.card_id)),
                );
            }
            follower
        } else {
            context_symbol
        };

        if !traded_symbols.contains(&traded_symbol) {
            traded_symbols.push(traded_symbol);
        }
    }

    if traded_symbols.len() > 1 {
        issues.push(Issue::error(
            "MVP_MULTIPLE_ASSETS",
            format!("strategy trades multiple assets: {}", traded_symbols.join(", ")),
        ));
    } else if traded_symbols.len() == 1 {
        let traded = &traded_symbols[0];
        let universe_ok = strategy.universe.len() == 1 && strategy.universe.contains(traded);
        if !universe_ok {
            issues.push(Issue::error(
                "MVP_UNIVERSE_MISMATCH",
                format!(
                    "traded symbol '{traded}' does not match strategy.universe {:?}",
                    strategy.universe
                ),
            ));
        }
    }
}

/// Hours-per-bar table (spec.md §4.F.6); unknown timeframes default to 1
/// hour with no extra issue.
fn hours_per_bar(tf: &str) -> f64 {
    match tf {
        "1m" => 1.0 / 60.0,
        "5m" => 5.0 / 60.0,
        "15m" => 15.0 / 60.0,
        "1h" => 1.0,
        "4h" => 4.0,
        "1d" => 24.0,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_per_bar_matches_table() {
        assert_eq!(hours_per_bar("1m"), 1.0 / 60.0);
        assert_eq!(hours_per_bar("1h"), 1.0);
        assert_eq!(hours_per_bar("1d"), 24.0);
        assert_eq!(hours_per_bar("unknown"), 1.0);
    }

    #[test]
    fn intermarket_trigger_mismatch_flags_violation() {
        let mut issues = Vec::new();
        let card = CompiledCard {
            role: Role::Entry,
            card_id: archetype_types::CardId::new(),
            card_revision_id: "x".to_string(),
            type_id: ArchetypeId::from_trusted(INTERMARKET_TRIGGER),
            effective_slots: serde_json::json!({
                "context": {"symbol": "BTC-USD"},
                "event": {"lead_follow": {"follower_symbol": "ETH-USD"}},
            }),
            compiled_condition: None,
            execution_spec: None,
            sizing_spec: None,
        };
        let strategy = Strategy {
            id: archetype_types::StrategyId::new(),
            owner_id: None,
            thread_id: None,
            name: "S".to_string(),
            status: crate::model::StrategyStatus::Draft,
            universe: vec!["ETH-USD".to_string()],
            attachments: vec![],
            version: 1,
            created_at: archetype_types::Timestamp::now(),
            updated_at: archetype_types::Timestamp::now(),
        };
        single_asset_check(&[card], &strategy, &mut issues);
        assert!(issues.iter().any(|i| i.code == "MVP_SINGLE_ASSET_VIOLATION"));
    }
}

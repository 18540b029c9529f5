//! End-to-end compilation scenarios (spec.md §8), run against the in-memory
//! stores plus the on-disk `catalog/` fixtures at the workspace root.

use std::path::PathBuf;
use std::sync::Arc;

use compiler_core::catalog::Catalog;
use compiler_core::model::StatusHint;
use compiler_core::store::memory::{InMemoryCardStore, InMemoryStrategyStore};
use compiler_core::StrategyService;

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
async fn minimum_viable_compile() {
    let svc = service();
    let strategy = svc
        .create_strategy("S", None, None, vec!["BTC-USD".to_string()])
        .await
        .unwrap();

    let entry_example = svc.get_schema_example("entry.trend_pullback", 0).unwrap().example_slots;
    svc.add_card(&strategy.id, "entry.trend_pullback", entry_example, None, None, true, true)
        .await
        .unwrap();

    let exit_example = svc.get_schema_example("exit.rule_trigger", 0).unwrap().example_slots;
    svc.add_card(&strategy.id, "exit.rule_trigger", exit_example, None, None, true, true)
        .await
        .unwrap();

    let result = svc.compile_strategy(&strategy.id).await.unwrap();
    assert_eq!(result.status_hint, StatusHint::Ready);
    let compiled = result.compiled.expect("ready compile must emit a plan");
    assert_eq!(compiled.cards.len(), 2);
    assert_eq!(compiled.data_requirements.len(), 1);
    let req = &compiled.data_requirements[0];
    assert_eq!(req.symbol, "BTC-USD");
    assert_eq!(req.tf, "1h");
    assert_eq!(req.min_bars, 200);
    assert_eq!(req.lookback_hours, 200.0);
    assert!(result.issues.iter().all(|i| i.severity == compiler_core::model::Severity::Warning));
}

#[tokio::test]
async fn invalid_override_range_blocks_compile() {
    let svc = service();
    let strategy = svc
        .create_strategy("S", None, None, vec!["BTC-USD".to_string()])
        .await
        .unwrap();

    let entry_example = svc.get_schema_example("entry.trend_pullback", 0).unwrap().example_slots;
    let overrides = serde_json::json!({"event": {"dip_band": {"mult": 10.0}}});
    let updated = svc
        .add_card(
            &strategy.id,
            "entry.trend_pullback",
            entry_example,
            None,
            Some(overrides),
            true,
            true,
        )
        .await
        .unwrap();

    let get = svc.get_strategy(&updated.id).await.unwrap();
    let card_id = get.cards[0].card_id.clone();

    let result = svc.compile_strategy(&strategy.id).await.unwrap();
    assert_eq!(result.status_hint, StatusHint::FixRequired);
    assert!(result.compiled.is_none());
    let validation_issue = result
        .issues
        .iter()
        .find(|i| i.code == "SLOT_VALIDATION_ERROR")
        .expect("override out of range must surface a validation issue");
    assert!(validation_issue.path.as_deref().unwrap().contains(&card_id));
}

#[tokio::test]
async fn revision_pin_mismatch_after_card_update() {
    let svc = service();
    let strategy = svc
        .create_strategy("S", None, None, vec!["BTC-USD".to_string()])
        .await
        .unwrap();

    let entry_example = svc.get_schema_example("entry.trend_pullback", 0).unwrap().example_slots;
    svc.add_card(
        &strategy.id,
        "entry.trend_pullback",
        entry_example.clone(),
        None,
        None,
        false,
        true,
    )
    .await
    .unwrap();

    let get = svc.get_strategy(&strategy.id).await.unwrap();
    let card_id = get.cards[0].card_id.clone();

    // Timestamp has millisecond resolution; guarantee update_card's new
    // updated_at differs from the pinned revision.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    svc.update_card(&card_id, entry_example).await.unwrap();

    let result = svc.compile_strategy(&strategy.id).await.unwrap();
    assert_eq!(result.status_hint, StatusHint::FixRequired);
    assert!(result.issues.iter().any(|i| i.code == "CARD_REVISION_NOT_FOUND"));
}

#[tokio::test]
async fn universe_mismatch_is_flagged() {
    let svc = service();
    let strategy = svc
        .create_strategy("S", None, None, vec!["ETH-USD".to_string()])
        .await
        .unwrap();

    let entry_example = svc.get_schema_example("entry.trend_pullback", 0).unwrap().example_slots;
    svc.add_card(&strategy.id, "entry.trend_pullback", entry_example, None, None, true, true)
        .await
        .unwrap();

    let result = svc.compile_strategy(&strategy.id).await.unwrap();
    assert_eq!(result.status_hint, StatusHint::FixRequired);
    assert!(result.issues.iter().any(|i| i.code == "MVP_UNIVERSE_MISMATCH"));
}

#[tokio::test]
async fn schema_etag_round_trips_regardless_of_if_none_match() {
    let svc = service();
    let first = svc.get_archetype_schema("entry.trend_pullback", None).unwrap();
    let second = svc
        .get_archetype_schema("entry.trend_pullback", Some(&first.etag))
        .unwrap();
    assert_eq!(first.etag, second.etag);
    assert_eq!(first.json_schema, second.json_schema);
    // spec.md §6: json_schema comes back with external $refs resolved, all
    // the way through nested refs inside the inlined common-defs fragment
    // (Context itself references Symbol/Timeframe internally).
    let context = &first.json_schema["properties"]["context"];
    assert!(context.get("$ref").is_none());
    assert!(context["properties"]["symbol"].get("$ref").is_none());
}

#[tokio::test]
async fn compile_and_validate_agree_on_ready_strategy() {
    let svc = service();
    let strategy = svc
        .create_strategy("S", None, None, vec!["BTC-USD".to_string()])
        .await
        .unwrap();

    let entry_example = svc.get_schema_example("entry.trend_pullback", 0).unwrap().example_slots;
    svc.add_card(&strategy.id, "entry.trend_pullback", entry_example, None, None, true, true)
        .await
        .unwrap();
    let exit_example = svc.get_schema_example("exit.rule_trigger", 0).unwrap().example_slots;
    svc.add_card(&strategy.id, "exit.rule_trigger", exit_example, None, None, true, true)
        .await
        .unwrap();

    let compiled = svc.compile_strategy(&strategy.id).await.unwrap();
    let validated = svc.validate_strategy(&strategy.id).await.unwrap();

    assert_eq!(compiled.status_hint, validated.status_hint);
    assert!(validated.compiled.is_none());
    assert_eq!(compiled.validation_summary.errors, validated.validation_summary.errors);
    assert_eq!(compiled.validation_summary.warnings, validated.validation_summary.warnings);
    assert_eq!(compiled.issues.len(), validated.issues.len());
}

#[tokio::test]
async fn zero_enabled_attachments_yields_no_entries_and_empty_universe() {
    let svc = service();
    let strategy = svc.create_strategy("S", None, None, vec![]).await.unwrap();

    let result = svc.compile_strategy(&strategy.id).await.unwrap();
    assert_eq!(result.status_hint, StatusHint::FixRequired);
    assert!(result.issues.iter().any(|i| i.code == "NO_ENTRIES"));
    assert!(result.issues.iter().any(|i| i.code == "EMPTY_UNIVERSE"));
}

#[tokio::test]
async fn deleting_a_referenced_card_does_not_cascade() {
    let svc = service();
    let strategy = svc
        .create_strategy("S", None, None, vec!["BTC-USD".to_string()])
        .await
        .unwrap();
    let entry_example = svc.get_schema_example("entry.trend_pullback", 0).unwrap().example_slots;
    svc.add_card(&strategy.id, "entry.trend_pullback", entry_example, None, None, true, true)
        .await
        .unwrap();

    let get = svc.get_strategy(&strategy.id).await.unwrap();
    let card_id = get.cards[0].card_id.clone();
    svc.delete_card(&card_id).await.unwrap();

    let result = svc.compile_strategy(&strategy.id).await.unwrap();
    assert_eq!(result.status_hint, StatusHint::FixRequired);
    assert!(result.issues.iter().any(|i| i.code == "CARD_NOT_FOUND"));
}

#[tokio::test]
async fn intermarket_trigger_single_asset_violation() {
    let svc = service();
    let strategy = svc
        .create_strategy("S", None, None, vec!["ETH-USD".to_string()])
        .await
        .unwrap();

    // Example context.symbol is "ETH-USD" matching follower_symbol; override
    // context.symbol to diverge from follower_symbol and trip the check.
    let example = svc.get_schema_example("entry.intermarket_trigger", 0).unwrap().example_slots;
    let overrides = serde_json::json!({"context": {"symbol": "BTC-USD"}});
    svc.add_card(
        &strategy.id,
        "entry.intermarket_trigger",
        example,
        None,
        Some(overrides),
        true,
        true,
    )
    .await
    .unwrap();

    let result = svc.compile_strategy(&strategy.id).await.unwrap();
    assert!(result.issues.iter().any(|i| i.code == "MVP_SINGLE_ASSET_VIOLATION"));
}

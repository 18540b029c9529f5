//! Condition/exec/sizing extractor (component E).
//!
//! Pulls and normalizes `event.condition`, `action.execution`, and
//! `action.sizing` out of a strategy card's effective slots, after merge.
//! Grounded on `original_source/src/tools/trading_tools.py`'s condition
//! normalization: a legacy `RegimeSpec` (a bare `metric` field, no `type`) is
//! wrapped into `{type: "regime", regime: <it>}` so downstream consumers
//! only ever see a tagged condition.

use serde_json::{json, Value};

fn normalize_condition_like(value: &Value) -> Option<Value> {
    let obj = value.as_object()?;
    if obj.contains_key("type") {
        return Some(value.clone());
    }
    if obj.contains_key("metric") {
        return Some(json!({"type": "regime", "regime": value.clone()}));
    }
    None
}

/// `compiled_condition`: `event.condition` if tagged or legacy-regime-shaped,
/// else the same check against `event.regime`, else `null`.
pub fn compiled_condition(effective_slots: &Value) -> Option<Value> {
    let event = effective_slots.get("event")?;
    if let Some(condition) = event.get("condition") {
        if let Some(normalized) = normalize_condition_like(condition) {
            return Some(normalized);
        }
    }
    if let Some(regime) = event.get("regime") {
        if let Some(normalized) = normalize_condition_like(regime) {
            return Some(normalized);
        }
    }
    None
}

/// `execution_spec`: `action.execution` verbatim, or `null`.
pub fn execution_spec(effective_slots: &Value) -> Option<Value> {
    effective_slots.get("action")?.get("execution").cloned()
}

/// `sizing_spec`: `action.sizing` verbatim, or `null`.
pub fn sizing_spec(effective_slots: &Value) -> Option<Value> {
    effective_slots.get("action")?.get("sizing").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_condition_passes_through_verbatim() {
        let slots = json!({"event": {"condition": {"type": "cross_above", "level": 1}}});
        assert_eq!(
            compiled_condition(&slots),
            Some(json!({"type": "cross_above", "level": 1}))
        );
    }

    #[test]
    fn legacy_regime_spec_is_wrapped() {
        let slots = json!({"event": {"condition": {"metric": "adx", "threshold": 20}}});
        assert_eq!(
            compiled_condition(&slots),
            Some(json!({"type": "regime", "regime": {"metric": "adx", "threshold": 20}}))
        );
    }

    #[test]
    fn falls_back_to_event_regime() {
        let slots = json!({"event": {"regime": {"type": "trend"}}});
        assert_eq!(compiled_condition(&slots), Some(json!({"type": "trend"})));
    }

    #[test]
    fn absent_condition_and_regime_is_null() {
        let slots = json!({"event": {}});
        assert_eq!(compiled_condition(&slots), None);
    }

    #[test]
    fn execution_and_sizing_pass_through() {
        let slots = json!({"action": {"execution": {"kind": "market"}, "sizing": {"kind": "fixed"}}});
        assert_eq!(execution_spec(&slots), Some(json!({"kind": "market"})));
        assert_eq!(sizing_spec(&slots), Some(json!({"kind": "fixed"})));
    }
}

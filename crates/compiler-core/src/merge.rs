//! Deep-merge engine (component D).
//!
//! `merge(base, override)`: objects merge key-by-key and recurse; anything
//! else takes `override`'s value wholesale, including `Value::Null` — an
//! override is allowed to explicitly nullify a field. `base` is never
//! mutated; the merge builds a new `Value`.
//!
//! The potential bug this guards against: conflating "the override map has
//! no entry for this key" with "the override map has this key set to
//! `null`". `serde_json::Map::get` already returns `Option<&Value>`, so
//! `None` (absent) and `Some(&Value::Null)` (present-but-null) are distinct
//! at the type level — the merge loop below relies on exactly that
//! distinction instead of re-deriving it with a parallel enum.

use serde_json::{Map, Value};

pub fn merge(base: &Value, over: &Value) -> Value {
    match (base, over) {
        (Value::Object(base_map), Value::Object(over_map)) => {
            Value::Object(merge_objects(base_map, over_map))
        }
        // override replaces base wholesale: scalars, arrays, type mismatches,
        // and explicit nulls all fall here.
        (_, over_value) => over_value.clone(),
    }
}

fn merge_objects(base: &Map<String, Value>, over: &Map<String, Value>) -> Map<String, Value> {
    let mut result = base.clone();
    for (key, over_value) in over {
        match base.get(key) {
            Some(base_value) => {
                result.insert(key.clone(), merge(base_value, over_value));
            }
            None => {
                result.insert(key.clone(), over_value.clone());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_only_in_base_are_preserved() {
        let base = json!({"a": 1, "b": 2});
        let over = json!({"b": 3});
        assert_eq!(merge(&base, &over), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn keys_only_in_override_appear_verbatim() {
        let base = json!({"a": 1});
        let over = json!({"c": {"d": 1}});
        assert_eq!(merge(&base, &over), json!({"a": 1, "c": {"d": 1}}));
    }

    #[test]
    fn nested_objects_recurse() {
        let base = json!({"event": {"condition": {"type": "cross_above"}, "other": 1}});
        let over = json!({"event": {"condition": {"mult": 2.0}}});
        assert_eq!(
            merge(&base, &over),
            json!({"event": {"condition": {"type": "cross_above", "mult": 2.0}, "other": 1}})
        );
    }

    #[test]
    fn explicit_null_in_override_nullifies_field() {
        let base = json!({"a": {"b": 1}});
        let over = json!({"a": null});
        assert_eq!(merge(&base, &over), json!({"a": null}));
    }

    #[test]
    fn absent_key_in_override_leaves_base_alone() {
        let base = json!({"a": {"b": 1}});
        let over = json!({});
        assert_eq!(merge(&base, &over), base);
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let base = json!({"tags": [1, 2, 3]});
        let over = json!({"tags": [4]});
        assert_eq!(merge(&base, &over), json!({"tags": [4]}));
    }

    #[test]
    fn base_is_not_mutated() {
        let base = json!({"a": 1});
        let base_clone = base.clone();
        let over = json!({"a": 2});
        let _ = merge(&base, &over);
        assert_eq!(base, base_clone);
    }
}

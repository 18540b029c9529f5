//! Slot validator (component C).
//!
//! Validates a slot tree against a JSON-Schema-draft-07 document that may
//! `$ref` into a shared common-definitions pool. Built on the `jsonschema`
//! crate the same way `familiar-core::validation::ContractEnforcer` compiles
//! a `Validator` from a schema `Value` — the difference here is that our
//! schemas resolve one external document (`common_defs.schema.json`) instead
//! of being fully self-contained at embed time, so a [`jsonschema::Retrieve`]
//! implementation stands in for `include_dir!`.

use jsonschema::{Retrieve, Uri, ValidationErrorKind};
use serde_json::Value;

use crate::model::SchemaConstraints;

/// One schema violation, path-qualified from the root of the slot tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Dotted path from the root to the offending node, or `"root"`.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

const COMMON_DEFS_URI_SUFFIX: &str = "common_defs.schema.json";

struct CommonDefsRetriever {
    common_defs: Option<Value>,
}

impl Retrieve for CommonDefsRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        if uri.as_str().ends_with(COMMON_DEFS_URI_SUFFIX) {
            self.common_defs
                .clone()
                .ok_or_else(|| "common definitions pool is not loaded".into())
        } else {
            Err(format!("unknown external schema reference: {uri}").into())
        }
    }
}

/// Validates slot trees against archetype schemas, resolving `$ref`s against
/// an optional shared common-definitions pool.
pub struct SlotValidator {
    common_defs: Option<Value>,
}

impl SlotValidator {
    pub fn new(common_defs: Option<Value>) -> Self {
        Self { common_defs }
    }

    /// Validate `slots` against `json_schema`. Never panics or returns an
    /// `Err` for a malformed/unresolvable schema: per spec.md §4.C, a schema
    /// that cannot compile (e.g. because the common-definitions pool is
    /// absent and a `$ref` needed it) surfaces as an ordinary validation
    /// error instead of an exception.
    pub fn validate(&self, json_schema: &Value, slots: &Value) -> Vec<ValidationIssue> {
        let retriever = CommonDefsRetriever {
            common_defs: self.common_defs.clone(),
        };

        let compiled = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .with_retriever(retriever)
            .build(json_schema);

        let validator = match compiled {
            Ok(v) => v,
            Err(e) => {
                return vec![ValidationIssue {
                    path: "root".to_string(),
                    message: format!("schema could not be compiled: {e}"),
                }]
            }
        };

        validator
            .iter_errors(slots)
            .map(|e| ValidationIssue {
                path: instance_path_to_dotted(&e.instance_path.to_string()),
                message: format_error_message(&e),
            })
            .collect()
    }

    pub fn is_valid(&self, json_schema: &Value, slots: &Value) -> bool {
        self.validate(json_schema, slots).is_empty()
    }
}

fn instance_path_to_dotted(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

/// Appends whichever of `{enum, minimum, maximum}` the violated keyword
/// carries, as a parenthesized hint (spec.md §4.C).
fn format_error_message(error: &jsonschema::ValidationError<'_>) -> String {
    let base = error.to_string();
    let hint = match &error.kind {
        ValidationErrorKind::Enum { options } => Some(format!("enum: {options}")),
        ValidationErrorKind::Minimum { limit } => Some(format!("minimum: {limit}")),
        ValidationErrorKind::Maximum { limit } => Some(format!("maximum: {limit}")),
        _ => None,
    };
    match hint {
        Some(hint) => format!("{base} ({hint})"),
        None => base,
    }
}

/// Parses the `constraints` object of an archetype schema document, tolerant
/// of absence (defaults apply — see [`SchemaConstraints`]).
pub fn parse_constraints(value: &Value) -> SchemaConstraints {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_slots_produce_no_issues() {
        let schema = json!({
            "type": "object",
            "properties": {"mult": {"type": "number", "maximum": 5.0}},
            "required": ["mult"],
        });
        let validator = SlotValidator::new(None);
        assert!(validator.is_valid(&schema, &json!({"mult": 2.0})));
    }

    #[test]
    fn out_of_range_value_reports_maximum_hint() {
        let schema = json!({
            "type": "object",
            "properties": {
                "event": {
                    "type": "object",
                    "properties": {
                        "dip_band": {
                            "type": "object",
                            "properties": {"mult": {"type": "number", "maximum": 5.0}},
                        }
                    },
                },
            },
        });
        let slots = json!({"event": {"dip_band": {"mult": 10.0}}});
        let validator = SlotValidator::new(None);
        let issues = validator.validate(&schema, &slots);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "event.dip_band.mult");
        assert!(issues[0].message.contains("maximum"));
    }

    #[test]
    fn missing_common_defs_pool_is_reported_as_validation_error_not_panic() {
        let schema = json!({"$ref": "common_defs.schema.json#/$defs/Symbol"});
        let validator = SlotValidator::new(None);
        let issues = validator.validate(&schema, &json!("BTC-USD"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "root");
    }

    #[test]
    fn common_defs_pool_resolves_external_ref() {
        let common_defs = json!({"$defs": {"Symbol": {"type": "string", "pattern": "^[A-Z-]+$"}}});
        let schema = json!({"$ref": "common_defs.schema.json#/$defs/Symbol"});
        let validator = SlotValidator::new(Some(common_defs));
        assert!(validator.is_valid(&schema, &json!("BTC-USD")));
        assert!(!validator.is_valid(&schema, &json!("btc-usd")));
    }
}

//! Catalog store (component A): read-only access to archetype metadata and
//! schemas, merged from per-kind sources plus a common-definitions pool.
//!
//! Catalog sources are JSON files on disk under `catalog/` (spec.md §6,
//! "Catalog layout on disk / source"). Unlike `ContractEnforcer::new()`'s
//! `include_dir!` compile-time embedding, these are read at process startup
//! with `std::fs`, because `original_source/src/scripts/seed_archetypes.py`
//! treats the catalog as operator-editable data rather than a compiled
//! artifact (see SPEC_FULL.md §3). The result is cached in the returned
//! `Catalog` for the lifetime of the process — the catalog is effectively
//! immutable after first load (spec.md §5).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use archetype_types::ArchetypeId;
use serde_json::Value;
use thiserror::Error;

use crate::errors::ToolError;
use crate::model::{Archetype, ArchetypeSchema, SchemaExample};
use crate::validator::SlotValidator;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("archetype '{0}' has no schema with at least one example")]
    MissingExample(String),
}

const KINDS: [&str; 4] = ["entry", "gate", "exit", "overlay"];

/// Accepts either a bare JSON array or `{"archetypes": [...]}` /
/// `{"schemas": [...]}` — the "legacy/alternate schema shapes" design note
/// in spec.md §9. Kept isolated here with its own tests so it never leaks
/// into the compiler.
pub mod normalize {
    use serde_json::Value;

    pub fn unwrap_list(value: Value, wrapper_key: &str) -> Vec<Value> {
        match value {
            Value::Array(items) => items,
            Value::Object(mut obj) => obj
                .remove(wrapper_key)
                .and_then(|v| v.as_array().cloned())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

pub struct Catalog {
    archetypes: HashMap<String, Archetype>,
    schemas: HashMap<String, ArchetypeSchema>,
    common_defs: Option<Value>,
    validator: SlotValidator,
}

impl Catalog {
    /// Load every per-kind archetype/schema file plus the common-definitions
    /// pool from `root` (typically the workspace's `catalog/` directory).
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let root = root.as_ref();
        let mut archetypes = HashMap::new();
        let mut schemas = HashMap::new();

        for kind in KINDS {
            let archetype_path = root.join("archetypes").join(format!("{kind}.json"));
            if archetype_path.exists() {
                let raw = read_json(&archetype_path)?;
                for entry in normalize::unwrap_list(raw, "archetypes") {
                    let archetype: Archetype = serde_json::from_value(entry).map_err(|source| {
                        CatalogError::Parse {
                            path: archetype_path.clone(),
                            source,
                        }
                    })?;
                    archetypes.insert(archetype.id.as_str().to_string(), archetype);
                }
            }

            let schema_path = root.join("schemas").join(format!("{kind}.json"));
            if schema_path.exists() {
                let raw = read_json(&schema_path)?;
                for entry in normalize::unwrap_list(raw, "schemas") {
                    let schema: ArchetypeSchema = serde_json::from_value(entry).map_err(|source| {
                        CatalogError::Parse {
                            path: schema_path.clone(),
                            source,
                        }
                    })?;
                    schemas.insert(schema.type_id.as_str().to_string(), schema);
                }
            }
        }

        // Every archetype must have a schema with at least one example
        // (spec.md §4.A invariant). Checked both ways: a schema with no
        // examples, and a listed (non-deprecated) archetype with no schema
        // at all — `list_archetypes` would otherwise surface an id that
        // `get_schema` can never resolve.
        for (id, schema) in &schemas {
            if schema.examples.is_empty() {
                return Err(CatalogError::MissingExample(id.clone()));
            }
        }
        for (id, archetype) in &archetypes {
            if !archetype.deprecated && !schemas.contains_key(id) {
                return Err(CatalogError::MissingExample(id.clone()));
            }
        }

        let common_defs_path = root.join("common_defs.schema.json");
        let common_defs = if common_defs_path.exists() {
            Some(read_json(&common_defs_path)?)
        } else {
            // Absence is tolerated: validation then fails on any $ref it
            // would have resolved, surfacing as a normal validation error
            // (spec.md §4.A).
            None
        };

        let validator = SlotValidator::new(common_defs.clone());

        Ok(Self {
            archetypes,
            schemas,
            common_defs,
            validator,
        })
    }

    pub fn validator(&self) -> &SlotValidator {
        &self.validator
    }

    pub fn common_defs(&self) -> Option<&Value> {
        self.common_defs.as_ref()
    }

    /// Lists non-deprecated archetypes, optionally filtered by kind.
    pub fn list_archetypes(&self, kind: Option<&str>) -> Result<Vec<Archetype>, ToolError> {
        if let Some(kind) = kind {
            if !KINDS.contains(&kind) {
                return Err(ToolError::validation_error(format!(
                    "invalid kind '{kind}': must be one of entry, exit, gate, overlay"
                )));
            }
        }

        let mut out: Vec<Archetype> = self
            .archetypes
            .values()
            .filter(|a| !a.deprecated)
            .filter(|a| kind.map(|k| a.kind() == k).unwrap_or(true))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(out)
    }

    pub fn get_archetype(&self, type_id: &ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(type_id.as_str())
    }

    pub fn get_schema(&self, type_id: &ArchetypeId) -> Option<&ArchetypeSchema> {
        self.schemas.get(type_id.as_str())
    }

    pub fn get_example(&self, type_id: &ArchetypeId, index: usize) -> Option<&SchemaExample> {
        self.schemas.get(type_id.as_str())?.examples.get(index)
    }

    /// Inlines every `$ref` into `common_defs.schema.json` so a caller gets
    /// a self-contained document (spec.md §6: `get_archetype_schema`'s
    /// `json_schema` is returned "with $refs resolved"). Refs within the
    /// schema's own document (e.g. a self-reference) are left untouched —
    /// only the external common-definitions pool is inlined here.
    pub fn resolve_schema_refs(&self, schema: &Value) -> Value {
        resolve_common_def_refs(schema, self.common_defs.as_ref(), false)
    }
}

const COMMON_DEFS_PREFIX: &str = "common_defs.schema.json#";

/// `in_pool` tracks whether `value` was reached by already stepping inside an
/// inlined common-defs fragment: once there, a bare `#/...` ref (as written
/// inside `common_defs.schema.json` itself, e.g. `Context`'s reference to
/// `Symbol`) is relative to the pool document, not the caller's schema, and
/// must resolve against `common_defs` too. A bare `#/...` ref encountered
/// before ever entering the pool belongs to the caller's own schema and is
/// left untouched, per the self-reference carve-out above.
fn resolve_common_def_refs(value: &Value, common_defs: Option<&Value>, in_pool: bool) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(r)) = map.get("$ref") {
                let pointer = r
                    .strip_prefix(COMMON_DEFS_PREFIX)
                    .or_else(|| in_pool.then(|| r.strip_prefix('#')).flatten());
                if let Some(pointer) = pointer {
                    if let Some(common) = common_defs {
                        if let Some(resolved) = common.pointer(pointer) {
                            return resolve_common_def_refs(resolved, common_defs, true);
                        }
                    }
                }
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                out.insert(key.clone(), resolve_common_def_refs(val, common_defs, in_pool));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_common_def_refs(item, common_defs, in_pool))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn read_json(path: &Path) -> Result<Value, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::normalize::unwrap_list;
    use serde_json::json;

    #[test]
    fn unwrap_list_accepts_bare_array() {
        let value = json!([{"id": "entry.a"}, {"id": "entry.b"}]);
        assert_eq!(unwrap_list(value, "archetypes").len(), 2);
    }

    #[test]
    fn unwrap_list_accepts_wrapped_object() {
        let value = json!({"archetypes": [{"id": "entry.a"}]});
        assert_eq!(unwrap_list(value, "archetypes").len(), 1);
    }

    #[test]
    fn unwrap_list_defaults_to_empty_on_mismatch() {
        let value = json!({"schemas": [{"type_id": "entry.a"}]});
        assert!(unwrap_list(value, "archetypes").is_empty());
    }

    #[test]
    fn resolve_schema_refs_inlines_common_defs() {
        let common_defs = json!({"$defs": {"Symbol": {"type": "string", "pattern": "^[A-Z-]+$"}}});
        let schema = json!({
            "type": "object",
            "properties": {"symbol": {"$ref": "common_defs.schema.json#/$defs/Symbol"}},
        });
        let resolved = super::resolve_common_def_refs(&schema, Some(&common_defs), false);
        assert_eq!(
            resolved["properties"]["symbol"],
            json!({"type": "string", "pattern": "^[A-Z-]+$"})
        );
    }

    #[test]
    fn resolve_schema_refs_leaves_unresolvable_ref_untouched_without_pool() {
        let schema = json!({"$ref": "common_defs.schema.json#/$defs/Symbol"});
        let resolved = super::resolve_common_def_refs(&schema, None, false);
        assert_eq!(resolved, schema);
    }

    #[test]
    fn resolve_schema_refs_follows_internal_refs_inside_inlined_fragment() {
        // Mirrors common_defs.schema.json: Context references Symbol via a
        // bare same-document "#/..." ref, which only makes sense once
        // resolved relative to the pool, not the caller's schema.
        let common_defs = json!({
            "$defs": {
                "Symbol": {"type": "string"},
                "Context": {
                    "type": "object",
                    "properties": {"symbol": {"$ref": "#/$defs/Symbol"}},
                },
            }
        });
        let schema = json!({
            "properties": {"context": {"$ref": "common_defs.schema.json#/$defs/Context"}},
        });
        let resolved = super::resolve_common_def_refs(&schema, Some(&common_defs), false);
        assert_eq!(
            resolved["properties"]["context"]["properties"]["symbol"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn resolve_schema_refs_leaves_bare_self_ref_untouched_outside_pool() {
        // A bare "#/..." ref written directly in the caller's own schema
        // (not reached via an inlined common-defs fragment) is a
        // self-reference within that schema's own document and must not be
        // treated as a pool lookup.
        let common_defs = json!({"$defs": {"Symbol": {"type": "string"}}});
        let schema = json!({"$ref": "#/$defs/Something"});
        let resolved = super::resolve_common_def_refs(&schema, Some(&common_defs), false);
        assert_eq!(resolved, schema);
    }
}

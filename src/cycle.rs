//! Self-reference-safe schema cloning.
//!
//! OpenAPI documents routinely contain recursive schemas
//! (`Node.children: array<Node>`). The schema engine compiles standalone
//! schema values, so every `$ref` has to be expanded into the value handed to
//! it - but unbounded expansion diverges on recursion. `break_cycles` expands
//! each distinct ref target exactly once, remembers the JSON-pointer location
//! of that first expansion (rooted at `"#"`), and rewrites every later
//! occurrence - sibling duplicate or true cycle - into a `$ref` pointing at
//! it. The output is self-contained, always serializable, and uses only
//! internal pointers the schema engine resolves natively.

use crate::spec::Document;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Deep-clone `schema`, inlining `$ref`s resolved against `document` and
/// replacing repeated targets with internal JSON-pointer references.
///
/// Unresolvable references are copied through untouched; the compiled
/// validator will reject them, which is the correct strict-mode signal.
pub fn break_cycles(schema: &Value, document: &Document) -> Value {
    let mut seen = HashMap::new();
    clone_value(schema, document, "#", &mut seen)
}

fn clone_value(
    value: &Value,
    document: &Document,
    path: &str,
    seen: &mut HashMap<String, String>,
) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                if reference.starts_with('#') {
                    if let Some(first_occurrence) = seen.get(reference) {
                        let mut link = Map::new();
                        link.insert("$ref".to_string(), Value::String(first_occurrence.clone()));
                        return Value::Object(link);
                    }
                    if let Some(target) = document.resolve_ref(reference) {
                        // The target lands at this node's pointer path.
                        seen.insert(reference.to_string(), path.to_string());
                        return clone_value(target, document, path, seen);
                    }
                }
                return value.clone();
            }
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                let child_path = format!("{path}/{}", escape_pointer_token(key));
                out.insert(key.clone(), clone_value(child, document, &child_path, seen));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, child)| {
                    let child_path = format!("{path}/{index}");
                    clone_value(child, document, &child_path, seen)
                })
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// RFC 6901 token escaping: `~` -> `~0`, `/` -> `~1`.
fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

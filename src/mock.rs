//! # Mock Engine
//!
//! Synthesizes responses for operations straight from the contract, used to
//! stub an API before any handler exists.
//!
//! ## Selection order
//!
//! For the chosen status and media type:
//!
//! 1. the media type's `example`
//! 2. an entry of its `examples` map (the named one when requested and
//!    present, otherwise the first)
//! 3. a value instantiated from its `schema`
//!
//! Schema instantiation is deterministic: `example` short-circuits at any
//! level, `allOf`/`anyOf` deep-merge their members, `oneOf` takes its first
//! member, enumerations pick their first value, arrays produce one element,
//! and primitives fall back by type and format. Recursion through `$ref`s
//! is capped; past the cap the mock is `null`.

use crate::error::{EngineError, EngineResult};
use crate::spec::Document;
use crate::status::{find_default_status_code_match, find_status_code_match};
use serde_json::{Map, Value};

/// Recursion cap for schema instantiation of self-referential documents.
const MAX_DEPTH: usize = 8;

/// Options for [`mock_response_for_operation`].
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Requested status code; the representative response is chosen when
    /// absent
    pub code: Option<u16>,
    /// Media type to mock, `application/json` by default
    pub media_type: String,
    /// Name of the entry to pick from the `examples` map
    pub example: Option<String>,
}

impl Default for MockOptions {
    fn default() -> Self {
        MockOptions {
            code: None,
            media_type: "application/json".to_string(),
            example: None,
        }
    }
}

/// Synthesize `(status, mock)` for an operation.
///
/// Fails when the operation is unknown or declares no responses. A status
/// or media type with nothing to mock yields `null`.
pub fn mock_response_for_operation(
    document: &Document,
    operation_id: &str,
    options: &MockOptions,
) -> EngineResult<(u16, Value)> {
    let operation = document
        .get_operation(operation_id)
        .ok_or_else(|| EngineError::UnknownOperation(operation_id.to_string()))?;
    if operation.responses.is_empty() {
        return Err(EngineError::NoResponses(operation_id.to_string()));
    }

    let (status, response) = match options.code {
        Some(code) => match find_status_code_match(code, &operation.responses) {
            Some(response) => (code, response),
            None => return Ok((code, Value::Null)),
        },
        None => find_default_status_code_match(&operation.responses)
            .expect("non-empty responses"),
    };

    let media_pointer = format!(
        "/content/{}",
        options.media_type.replace('~', "~0").replace('/', "~1")
    );
    let Some(media) = response.pointer(&media_pointer) else {
        return Ok((status, Value::Null));
    };

    if let Some(example) = media.get("example") {
        return Ok((status, example.clone()));
    }

    if let Some(examples) = media.get("examples").and_then(Value::as_object) {
        let chosen = options
            .example
            .as_deref()
            .and_then(|name| examples.get(name))
            .or_else(|| examples.values().next());
        if let Some(entry) = chosen {
            let entry = resolve(entry, document).unwrap_or(entry);
            if let Some(value) = entry.get("value") {
                return Ok((status, value.clone()));
            }
        }
    }

    if let Some(schema) = media.get("schema") {
        return Ok((status, example_from_schema(schema, document)));
    }

    Ok((status, Value::Null))
}

/// Instantiate a representative value from a schema.
#[must_use]
pub fn example_from_schema(schema: &Value, document: &Document) -> Value {
    instantiate(schema, document, 0)
}

fn resolve<'a>(value: &'a Value, document: &'a Document) -> Option<&'a Value> {
    let reference = value.get("$ref")?.as_str()?;
    document.resolve_ref(reference)
}

fn instantiate(schema: &Value, document: &Document, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::Null;
    }
    let schema = resolve(schema, document).unwrap_or(schema);

    if let Some(example) = schema.get("example") {
        return example.clone();
    }

    if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
        return merge_members(members, document, depth);
    }
    if let Some(members) = schema.get("anyOf").and_then(Value::as_array) {
        return merge_members(members, document, depth);
    }
    if let Some(members) = schema.get("oneOf").and_then(Value::as_array) {
        return members
            .first()
            .map(|member| instantiate(member, document, depth + 1))
            .unwrap_or(Value::Null);
    }

    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        return values.first().cloned().unwrap_or(Value::Null);
    }

    let declared_type = schema.get("type").and_then(Value::as_str);

    if declared_type == Some("array") || schema.get("items").is_some() {
        return match schema.get("items") {
            Some(items) => Value::Array(vec![instantiate(items, document, depth + 1)]),
            None => Value::Array(Vec::new()),
        };
    }

    if declared_type == Some("object") || schema.get("properties").is_some() {
        let mut out = Map::new();
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                out.insert(name.clone(), instantiate(property, document, depth + 1));
            }
        }
        return Value::Object(out);
    }

    match declared_type {
        Some("string") => Value::String(
            string_exemplar(schema.get("format").and_then(Value::as_str)).to_string(),
        ),
        Some("integer") | Some("number") => schema
            .get("minimum")
            .cloned()
            .unwrap_or_else(|| Value::from(0)),
        Some("boolean") => Value::Bool(false),
        _ => Value::Null,
    }
}

fn merge_members(members: &[Value], document: &Document, depth: usize) -> Value {
    let mut merged = Value::Null;
    for member in members {
        let value = instantiate(member, document, depth + 1);
        merged = deep_merge(merged, value);
    }
    merged
}

/// Deep merge for composed object mocks; the later value wins elsewhere.
fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

fn string_exemplar(format: Option<&str>) -> &'static str {
    match format {
        Some("date") => "2020-01-01",
        Some("date-time") => "2020-01-01T00:00:00Z",
        Some("uuid") => "00000000-0000-0000-0000-000000000000",
        Some("email") => "user@example.com",
        Some("hostname") => "example.com",
        Some("uri") | Some("url") => "https://example.com/",
        Some("ipv4") => "127.0.0.1",
        Some("ipv6") => "::1",
        _ => "",
    }
}

//! Composite-schema synthesis for the per-operation validators.
//!
//! The validation input is one JSON object: `{ path, query, header, cookie,
//! requestBody }`. The builders here wrap the document's schemas into
//! envelopes over that shape. `path` and `query` are closed
//! (`additionalProperties: false`), `header` and `cookie` open - requests
//! legitimately carry headers and cookies the contract never mentions.

use crate::spec::{Operation, ParameterLocation};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Envelope for the request body validator.
///
/// `requestBody` is required only when `application/json` is the sole
/// declared media type; with alternatives on offer an absent JSON body may
/// simply mean another media type was sent.
pub(crate) fn request_body_schema(operation: &Operation) -> Option<Value> {
    let schema = operation.json_body_schema()?.clone();
    let required: Vec<&str> = if operation.declares_only_json_body() {
        vec!["requestBody"]
    } else {
        vec![]
    };
    Some(json!({
        "type": "object",
        "additionalProperties": true,
        "properties": { "requestBody": schema },
        "required": required
    }))
}

/// Envelope for the parameter validator: four location buckets.
pub(crate) fn parameters_schema(operation: &Operation) -> Value {
    let locations = [
        (ParameterLocation::Path, false),
        (ParameterLocation::Query, false),
        (ParameterLocation::Header, true),
        (ParameterLocation::Cookie, true),
    ];

    let mut buckets = Map::new();
    let mut outer_required: Vec<String> = Vec::new();

    for (location, additional) in locations {
        let mut properties = Map::new();
        let mut required: Vec<String> = Vec::new();

        for param in operation.parameters.iter().filter(|p| p.location == location) {
            let schema = param
                .content_json_schema
                .clone()
                .or_else(|| param.schema.clone())
                .unwrap_or_else(|| json!({}));
            properties.insert(param.name.clone(), schema);
            if param.required {
                required.push(param.name.clone());
                let slot = location.as_str().to_string();
                if !outer_required.contains(&slot) {
                    outer_required.push(slot);
                }
            }
        }

        buckets.insert(
            location.as_str().to_string(),
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": additional
            }),
        );
    }

    json!({
        "type": "object",
        "properties": buckets,
        "required": outer_required
    })
}

/// All declared JSON response schemas folded into one `oneOf`, or `None`
/// when the operation declares none.
pub(crate) fn response_schema(operation: &Operation) -> Option<Value> {
    let schemas: Vec<Value> = operation
        .responses
        .values()
        .filter_map(|response| response.pointer("/content/application~1json/schema"))
        .cloned()
        .collect();
    if schemas.is_empty() {
        return None;
    }
    Some(json!({ "oneOf": schemas }))
}

/// Individual JSON response schemas keyed by status.
pub(crate) fn status_response_schemas(operation: &Operation) -> IndexMap<String, Value> {
    operation
        .responses
        .iter()
        .filter_map(|(status, response)| {
            response
                .pointer("/content/application~1json/schema")
                .map(|schema| (status.clone(), schema.clone()))
        })
        .collect()
}

/// How declared response headers are matched against actual ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetMatchType {
    /// Declared headers that are present must validate; anything else goes.
    #[default]
    Any,
    /// Every declared header must be present; extras are allowed.
    Superset,
    /// Only declared headers may appear; none are mandatory.
    Subset,
    /// Exactly the declared header set.
    Exact,
}

/// Header schemas per status key, one per [`SetMatchType`] flavor, in the
/// order `[Any, Superset, Subset, Exact]`.
pub(crate) fn response_headers_schemas(operation: &Operation) -> IndexMap<String, [Value; 4]> {
    operation
        .responses
        .iter()
        .map(|(status, response)| {
            let mut properties = Map::new();
            let mut declared: Vec<String> = Vec::new();
            if let Some(headers) = response.get("headers").and_then(Value::as_object) {
                for (name, header) in headers {
                    let name = name.to_lowercase();
                    let schema = header.get("schema").cloned().unwrap_or_else(|| json!({}));
                    properties.insert(name.clone(), schema);
                    declared.push(name);
                }
            }

            let flavor = |additional: bool, require_all: bool| {
                let required: Vec<String> = if require_all {
                    declared.clone()
                } else {
                    Vec::new()
                };
                json!({
                    "type": "object",
                    "properties": {
                        "headers": {
                            "type": "object",
                            "properties": properties.clone(),
                            "required": required,
                            "additionalProperties": additional
                        }
                    }
                })
            };

            let flavors = [
                flavor(true, false),  // Any
                flavor(true, true),   // Superset
                flavor(false, false), // Subset
                flavor(false, true),  // Exact
            ];
            (status.clone(), flavors)
        })
        .collect()
}

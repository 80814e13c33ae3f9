use super::types::{Operation, ParameterLocation, ParameterMeta, ParameterStyle, SecurityRequirement};
use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Method keys recognized inside a path item, in OpenAPI order.
pub(crate) const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

fn method_from_key(key: &str) -> Option<Method> {
    match key {
        "get" => Some(Method::GET),
        "put" => Some(Method::PUT),
        "post" => Some(Method::POST),
        "delete" => Some(Method::DELETE),
        "options" => Some(Method::OPTIONS),
        "head" => Some(Method::HEAD),
        "patch" => Some(Method::PATCH),
        "trace" => Some(Method::TRACE),
        _ => None,
    }
}

/// Follow a top-level `{"$ref": "#/..."}` indirection, in place.
fn resolve_top_ref<'a>(raw: &'a Value, value: &'a Value) -> &'a Value {
    if let Some(reference) = value.get("$ref").and_then(Value::as_str) {
        if let Some(pointer) = reference.strip_prefix('#') {
            if let Some(target) = raw.pointer(pointer) {
                return target;
            }
            warn!(reference = reference, "Unresolvable $ref in document");
        }
    }
    value
}

/// Extract parameter metadata from a `parameters` array
///
/// Resolves parameter `$ref`s, lowercases header names, and captures the
/// schema (or the `content["application/json"]` schema), style, and explode
/// flag of each entry. Entries that are not objects or lack `name`/`in` are
/// skipped with a warning.
pub(crate) fn extract_parameters(raw: &Value, params: Option<&Value>) -> Vec<ParameterMeta> {
    let mut out = Vec::new();
    let Some(list) = params.and_then(Value::as_array) else {
        return out;
    };
    for entry in list {
        let param = resolve_top_ref(raw, entry);
        let (Some(name), Some(location)) = (
            param.get("name").and_then(Value::as_str),
            param
                .get("in")
                .and_then(Value::as_str)
                .and_then(ParameterLocation::parse),
        ) else {
            warn!(parameter = %entry, "Skipping malformed parameter");
            continue;
        };

        let name = if location == ParameterLocation::Header {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };

        let content_json_schema = param
            .pointer("/content/application~1json/schema")
            .cloned();

        out.push(ParameterMeta {
            name,
            location,
            required: param
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            schema: param.get("schema").cloned(),
            content_json_schema,
            style: param
                .get("style")
                .and_then(Value::as_str)
                .and_then(ParameterStyle::parse),
            explode: param.get("explode").and_then(Value::as_bool),
        });
    }
    out
}

fn parse_security(value: Option<&Value>) -> Option<Vec<SecurityRequirement>> {
    let list = value?.as_array()?;
    let requirements = list
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(scheme, scopes)| {
                    let scopes = scopes
                        .as_array()
                        .map(|s| {
                            s.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    (scheme.clone(), scopes)
                })
                .collect::<SecurityRequirement>()
        })
        .collect();
    Some(requirements)
}

fn extract_responses(raw: &Value, operation: &Value) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
        for (status, response) in responses {
            out.insert(status.clone(), resolve_top_ref(raw, response).clone());
        }
    }
    out
}

/// Flatten `paths` x methods into the operation index
///
/// Each record carries the operation's own parameters first, then inherited
/// path-level parameters, de-duplicated by `(name, in)` so operation-level
/// definitions win. Effective security is the operation's `security` when
/// present (an explicit empty list counts as present), else the document's.
pub(crate) fn build_operations(raw: &Value) -> Vec<Arc<Operation>> {
    let mut operations = Vec::new();
    let document_security = parse_security(raw.get("security")).unwrap_or_default();

    let Some(paths) = raw.get("paths").and_then(Value::as_object) else {
        return operations;
    };

    for (path, item) in paths {
        let item = resolve_top_ref(raw, item);
        let path_parameters = extract_parameters(raw, item.get("parameters"));

        for method_key in METHODS {
            let Some(op_value) = item.get(method_key) else {
                continue;
            };
            let Some(method) = method_from_key(method_key) else {
                continue;
            };

            let mut parameters = extract_parameters(raw, op_value.get("parameters"));
            for inherited in &path_parameters {
                let duplicate = parameters
                    .iter()
                    .any(|p| p.name == inherited.name && p.location == inherited.location);
                if !duplicate {
                    parameters.push(inherited.clone());
                }
            }

            let request_body = op_value
                .get("requestBody")
                .map(|body| resolve_top_ref(raw, body).clone());

            let security = parse_security(op_value.get("security"))
                .unwrap_or_else(|| document_security.clone());

            operations.push(Arc::new(Operation {
                method,
                path: path.clone(),
                operation_id: op_value
                    .get("operationId")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                parameters,
                request_body,
                responses: extract_responses(raw, op_value),
                security,
            }));
        }
    }

    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(doc: Value) -> Vec<Arc<Operation>> {
        build_operations(&doc)
    }

    #[test]
    fn test_flattens_paths_and_methods() {
        let ops = build(json!({
            "paths": {
                "/pets": {
                    "get": { "operationId": "listPets", "responses": { "200": {} } },
                    "post": { "operationId": "createPet", "responses": { "201": {} } }
                },
                "/pets/{id}": {
                    "get": { "operationId": "getPetById", "responses": { "200": {} } }
                }
            }
        }));
        assert_eq!(ops.len(), 3);
        let pairs: Vec<(String, String)> = ops
            .iter()
            .map(|op| (op.method.to_string(), op.path.clone()))
            .collect();
        let mut unique = pairs.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), pairs.len(), "(method, path) pairs must be unique");
    }

    #[test]
    fn test_operation_parameters_win_over_path_level() {
        let ops = build(json!({
            "paths": {
                "/pets/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } },
                        { "name": "verbose", "in": "query", "schema": { "type": "boolean" } }
                    ],
                    "get": {
                        "operationId": "getPetById",
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                        ],
                        "responses": { "200": {} }
                    }
                }
            }
        }));
        let op = &ops[0];
        assert_eq!(op.parameters.len(), 2);
        assert_eq!(op.parameters[0].name, "id");
        assert_eq!(op.parameters[0].schema, Some(json!({ "type": "integer" })));
        assert_eq!(op.parameters[1].name, "verbose");
    }

    #[test]
    fn test_empty_operation_security_overrides_document() {
        let ops = build(json!({
            "security": [ { "apiKey": [] } ],
            "paths": {
                "/open": { "get": { "operationId": "open", "security": [], "responses": { "200": {} } } },
                "/locked": { "get": { "operationId": "locked", "responses": { "200": {} } } }
            }
        }));
        let open = ops.iter().find(|o| o.path == "/open").unwrap();
        let locked = ops.iter().find(|o| o.path == "/locked").unwrap();
        assert!(open.security.is_empty());
        assert_eq!(locked.security.len(), 1);
        assert!(locked.security[0].contains_key("apiKey"));
    }

    #[test]
    fn test_header_parameter_names_are_lowercased() {
        let ops = build(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "operationId": "listPets",
                        "parameters": [
                            { "name": "X-Request-Id", "in": "header", "schema": { "type": "string" } }
                        ],
                        "responses": { "200": {} }
                    }
                }
            }
        }));
        assert_eq!(ops[0].parameters[0].name, "x-request-id");
    }

    #[test]
    fn test_parameter_refs_are_resolved() {
        let ops = build(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "operationId": "listPets",
                        "parameters": [ { "$ref": "#/components/parameters/Limit" } ],
                        "responses": { "200": {} }
                    }
                }
            },
            "components": {
                "parameters": {
                    "Limit": { "name": "limit", "in": "query", "schema": { "type": "integer" } }
                }
            }
        }));
        assert_eq!(ops[0].parameters[0].name, "limit");
        assert_eq!(ops[0].parameters[0].location, ParameterLocation::Query);
    }

    #[test]
    fn test_unknown_verbs_are_ignored() {
        let ops = build(json!({
            "paths": {
                "/pets": {
                    "get": { "operationId": "listPets", "responses": { "200": {} } },
                    "describe": { "operationId": "bogus" },
                    "summary": "not an operation"
                }
            }
        }));
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operation_id.as_deref(), Some("listPets"));
    }

    #[test]
    fn test_responses_preserve_document_order() {
        let ops = build(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "operationId": "listPets",
                        "responses": { "404": {}, "200": {}, "default": {} }
                    }
                }
            }
        }));
        let keys: Vec<&String> = ops[0].responses.keys().collect();
        assert_eq!(keys, ["404", "200", "default"]);
    }
}

//! String-to-typed coercion for parameter buckets.
//!
//! Path, query, header, and cookie values arrive as strings. The schema
//! engine validates values as-is, so before validation each parameter value
//! is converted to the type its schema declares: numeric and boolean
//! strings are parsed, and singular query values are wrapped into
//! single-element arrays when the schema wants one. Values that do not
//! parse stay strings and fail validation with a type error, which is the
//! desired report.

use crate::spec::{Document, Operation, ParameterLocation};
use serde_json::{Map, Value};

fn schema_type(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

/// Follow a top-level `$ref` so the declared type is visible.
fn resolve_schema<'a>(schema: &'a Value, document: &'a Document) -> &'a Value {
    schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| document.resolve_ref(reference))
        .unwrap_or(schema)
}

fn coerce_in_place(value: &mut Value, schema: &Value, document: &Document) {
    match schema_type(schema) {
        Some("integer") => {
            if let Value::String(text) = value {
                if let Ok(parsed) = text.parse::<i64>() {
                    *value = Value::from(parsed);
                }
            }
        }
        Some("number") => {
            if let Value::String(text) = value {
                if let Ok(parsed) = text.parse::<f64>() {
                    if let Some(number) = serde_json::Number::from_f64(parsed) {
                        *value = Value::Number(number);
                    }
                }
            }
        }
        Some("boolean") => {
            if let Value::String(text) = value {
                if let Ok(parsed) = text.parse::<bool>() {
                    *value = Value::Bool(parsed);
                }
            }
        }
        Some("array") => {
            let items = schema
                .get("items")
                .map(|items| resolve_schema(items, document));
            if let (Value::Array(elements), Some(items)) = (&mut *value, items) {
                for element in elements {
                    coerce_in_place(element, items, document);
                }
            }
        }
        _ => {}
    }
}

/// Coerce one location bucket of a parsed request against the operation's
/// declared parameters, returning the bucket as a JSON object.
pub(crate) fn coerce_bucket(
    bucket: &Map<String, Value>,
    operation: &Operation,
    location: ParameterLocation,
    document: &Document,
) -> Value {
    let mut out = bucket.clone();
    for param in operation
        .parameters
        .iter()
        .filter(|p| p.location == location)
    {
        let Some(value) = out.get_mut(&param.name) else {
            continue;
        };
        let Some(schema) = &param.schema else {
            continue;
        };
        let schema = resolve_schema(schema, document);

        // An under-specified single-element list arrives as a lone string.
        if location == ParameterLocation::Query
            && schema_type(schema) == Some("array")
            && !value.is_array()
        {
            let single = value.take();
            *value = Value::Array(vec![single]);
        }

        coerce_in_place(value, schema, document);
    }
    Value::Object(out)
}

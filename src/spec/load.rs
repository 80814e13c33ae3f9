use super::types::Document;
use crate::config::Definition;
use crate::error::{EngineError, EngineResult};
use serde_json::Value;
use tracing::warn;

/// Remove non-method keys from path items before structural validation.
///
/// Real-world documents carry vendor keys next to the method verbs; the
/// typed validation model rejects them, so they are stripped from the copy
/// that validation sees. The engine's own document is left untouched.
fn strip_unknown_verbs(val: &mut Value) {
    if let Some(Value::Object(paths_map)) = val.get_mut("paths") {
        for item in paths_map.values_mut() {
            if let Value::Object(obj) = item {
                let keys: Vec<String> = obj.keys().cloned().collect();
                for k in keys {
                    let lk = k.to_ascii_lowercase();
                    let keep = match lk.as_str() {
                        "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                        m if super::build::METHODS.contains(&m) => true,
                        _ => k.starts_with("x-"),
                    };
                    if !keep {
                        obj.remove(&k);
                    }
                }
            }
        }
    }
}

/// Decode the definition into a JSON value.
///
/// Files ending in `.yaml`/`.yml` are decoded as YAML, everything else as
/// JSON. Read and decode failures always propagate: an unreadable document
/// leaves nothing for the engine to serve.
pub fn load_definition(definition: &Definition) -> EngineResult<Value> {
    match definition {
        Definition::Inline(value) => Ok(value.clone()),
        Definition::File(path) => {
            let content = std::fs::read_to_string(path)?;
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            if is_yaml {
                serde_yaml::from_str(&content)
                    .map_err(|e| EngineError::InvalidDefinition(e.to_string()))
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| EngineError::InvalidDefinition(e.to_string()))
            }
        }
    }
}

/// Structural validation of a decoded document.
///
/// Checks that the document declares OpenAPI 3.0.x and round-trips it
/// through the typed `oas3` model. Returns the failure text; the caller
/// decides whether that is fatal (strict) or a warning.
pub fn validate_document(raw: &Value) -> Result<(), String> {
    let version = raw
        .get("openapi")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !version.starts_with("3.0") {
        return Err(format!(
            "unsupported OpenAPI version {version:?}, expected 3.0.x"
        ));
    }

    let mut sanitized = raw.clone();
    strip_unknown_verbs(&mut sanitized);
    serde_json::from_value::<oas3::OpenApiV3Spec>(sanitized).map_err(|e| e.to_string())?;
    Ok(())
}

/// Load, optionally validate, and index a definition.
///
/// With `quick` set the structural validation pass is skipped entirely.
/// Otherwise validation failures are errors in strict mode and warnings
/// elsewhere: the engine stays usable, operations just keep whatever the
/// document gave them.
pub fn load_document(definition: &Definition, strict: bool, quick: bool) -> EngineResult<Document> {
    let raw = load_definition(definition)?;

    if !quick {
        if let Err(reason) = validate_document(&raw) {
            if strict {
                return Err(EngineError::InvalidDefinition(reason));
            }
            warn!(reason = %reason, "Document failed validation, continuing");
        }
    }

    Ok(Document::new(raw))
}

use super::coerce::coerce_bucket;
use super::schemas::{self, SetMatchType};
use crate::cycle::break_cycles;
use crate::error::{EngineError, EngineResult};
use crate::router::ParsedRequest;
use crate::spec::{Document, Operation, ParameterLocation};
use crate::status::{find_default_status_code_match, find_status_code_match};
use indexmap::IndexMap;
use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One reported validation failure.
///
/// `keyword` names the failed schema keyword (`type`, `required`, ...),
/// derived from the tail of the schema path; the synthetic body-parse
/// failure uses the keyword `parse` with schema path `#/requestBody`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorItem {
    /// Failed schema keyword
    pub keyword: String,
    /// JSON pointer to the offending value
    pub instance_path: String,
    /// JSON pointer into the composite schema, `#`-rooted
    pub schema_path: String,
    /// Human-readable description
    pub message: String,
}

/// Outcome of a validation run. Errors accumulate; nothing short-circuits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// Whether the value passed every validator
    pub valid: bool,
    /// Collected failures, `None` when valid
    pub errors: Option<Vec<ValidationErrorItem>>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub fn passing() -> Self {
        ValidationResult {
            valid: true,
            errors: None,
        }
    }

    fn from_errors(errors: Vec<ValidationErrorItem>) -> Self {
        if errors.is_empty() {
            Self::passing()
        } else {
            ValidationResult {
                valid: false,
                errors: Some(errors),
            }
        }
    }
}

/// Options for [`ValidatorRegistry::validate_response_headers`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseHeadersOptions {
    /// Response status, when known; otherwise the representative response is
    /// picked the same way the mock engine picks one
    pub status: Option<u16>,
    /// Set-matching policy, [`SetMatchType::Any`] by default
    pub set_match_type: SetMatchType,
}

struct HeaderValidators {
    any: Arc<JSONSchema>,
    superset: Arc<JSONSchema>,
    subset: Arc<JSONSchema>,
    exact: Arc<JSONSchema>,
}

#[derive(Default)]
struct OperationValidators {
    /// Request validators in run order: body (when declared) before params.
    request: Vec<Arc<JSONSchema>>,
    /// The `oneOf` over every declared JSON response schema.
    response: Option<Arc<JSONSchema>>,
    /// Individual response validators by status key.
    status_responses: IndexMap<String, Arc<JSONSchema>>,
    /// Header validators by status key.
    response_headers: IndexMap<String, HeaderValidators>,
}

/// Compiled validators for every operation of a document
///
/// Built once at init. Schemas are cycle-broken and compiled eagerly; a
/// schema that fails to compile is an error in strict mode and a logged gap
/// otherwise - the operation then simply has no validator of that kind.
pub struct ValidatorRegistry {
    document: Arc<Document>,
    operations: HashMap<String, OperationValidators>,
}

impl ValidatorRegistry {
    /// Compile validators for all operations that carry an `operationId`.
    pub fn build(document: Arc<Document>, strict: bool) -> EngineResult<Self> {
        let mut operations = HashMap::new();

        for operation in document.operations() {
            let Some(operation_id) = operation.operation_id.clone() else {
                continue;
            };
            let mut compiled = OperationValidators::default();

            if let Some(schema) = schemas::request_body_schema(operation) {
                if let Some(validator) =
                    compile(&schema, &document, strict, &operation_id, "request body")?
                {
                    compiled.request.push(validator);
                }
            }
            let params = schemas::parameters_schema(operation);
            if let Some(validator) =
                compile(&params, &document, strict, &operation_id, "parameters")?
            {
                compiled.request.push(validator);
            }

            if let Some(schema) = schemas::response_schema(operation) {
                compiled.response =
                    compile(&schema, &document, strict, &operation_id, "response")?;
            }

            for (status, schema) in schemas::status_response_schemas(operation) {
                if let Some(validator) =
                    compile(&schema, &document, strict, &operation_id, "response")?
                {
                    compiled.status_responses.insert(status, validator);
                }
            }

            for (status, flavors) in schemas::response_headers_schemas(operation) {
                let [any, superset, subset, exact] = flavors;
                let all = (
                    compile(&any, &document, strict, &operation_id, "response headers")?,
                    compile(&superset, &document, strict, &operation_id, "response headers")?,
                    compile(&subset, &document, strict, &operation_id, "response headers")?,
                    compile(&exact, &document, strict, &operation_id, "response headers")?,
                );
                if let (Some(any), Some(superset), Some(subset), Some(exact)) = all {
                    compiled.response_headers.insert(
                        status,
                        HeaderValidators {
                            any,
                            superset,
                            subset,
                            exact,
                        },
                    );
                }
            }

            debug!(
                operation_id = %operation_id,
                request_validators = compiled.request.len(),
                status_validators = compiled.status_responses.len(),
                "Validators compiled"
            );
            operations.insert(operation_id, compiled);
        }

        Ok(ValidatorRegistry {
            document,
            operations,
        })
    }

    /// Whether any validators were compiled for the operation.
    #[must_use]
    pub fn has_validators(&self, operation_id: &str) -> bool {
        self.operations.contains_key(operation_id)
    }

    /// Validate a parsed request against the operation's compiled validators.
    ///
    /// Builds the composite input (coerced parameter buckets plus the
    /// request body), runs every request validator in order, and accumulates
    /// all failures. A string body that must be JSON but does not parse is
    /// reported as a synthetic `parse` error.
    #[must_use]
    pub fn validate_request(
        &self,
        parsed: &ParsedRequest,
        operation: &Operation,
    ) -> ValidationResult {
        let validators = operation
            .operation_id
            .as_deref()
            .and_then(|id| self.operations.get(id));
        let Some(validators) = validators else {
            return ValidationResult::passing();
        };

        let mut errors = Vec::new();
        let mut input = Map::new();
        for (bucket, location) in [
            (&parsed.params, ParameterLocation::Path),
            (&parsed.query, ParameterLocation::Query),
            (&parsed.headers, ParameterLocation::Header),
            (&parsed.cookies, ParameterLocation::Cookie),
        ] {
            input.insert(
                location.as_str().to_string(),
                coerce_bucket(bucket, operation, location, &self.document),
            );
        }

        let mut body = parsed.body.clone();
        if let Some(Value::String(text)) = &parsed.body {
            if operation.declares_only_json_body() {
                match serde_json::from_str::<Value>(text) {
                    Ok(decoded) => body = Some(decoded),
                    Err(e) => errors.push(ValidationErrorItem {
                        keyword: "parse".to_string(),
                        instance_path: "/requestBody".to_string(),
                        schema_path: "#/requestBody".to_string(),
                        message: format!("request body is not valid JSON: {e}"),
                    }),
                }
            }
        }

        let json_content_type = parsed
            .headers
            .get("content-type")
            .and_then(Value::as_str)
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);
        if let Some(body) = body {
            if body.is_object() || body.is_array() || json_content_type {
                input.insert("requestBody".to_string(), body);
            }
        }

        let input = Value::Object(input);
        for validator in &validators.request {
            collect_errors(validator, &input, &mut errors);
        }
        ValidationResult::from_errors(errors)
    }

    /// Validate a response body for an operation.
    ///
    /// With a status code, the status-keyed validator is resolved through
    /// the status matcher; without one, the combined `oneOf` validator runs.
    /// A missing validator means there is nothing to check.
    pub fn validate_response(
        &self,
        response: &Value,
        operation_id: &str,
        status: Option<u16>,
    ) -> EngineResult<ValidationResult> {
        if self.document.get_operation(operation_id).is_none() {
            return Err(EngineError::UnknownOperation(operation_id.to_string()));
        }
        let Some(validators) = self.operations.get(operation_id) else {
            return Ok(ValidationResult::passing());
        };

        let validator = match status {
            Some(code) => find_status_code_match(code, &validators.status_responses),
            None => validators.response.as_ref(),
        };
        let Some(validator) = validator else {
            return Ok(ValidationResult::passing());
        };

        let mut errors = Vec::new();
        collect_errors(validator, response, &mut errors);
        Ok(ValidationResult::from_errors(errors))
    }

    /// Validate response headers for an operation.
    ///
    /// Header keys are lowercased before validation. The validator is
    /// resolved by status through the status matcher, or - when no status is
    /// given - through the same representative-response choice the mock
    /// engine uses.
    pub fn validate_response_headers(
        &self,
        headers: &Map<String, Value>,
        operation_id: &str,
        options: &ResponseHeadersOptions,
    ) -> EngineResult<ValidationResult> {
        if self.document.get_operation(operation_id).is_none() {
            return Err(EngineError::UnknownOperation(operation_id.to_string()));
        }
        let Some(validators) = self.operations.get(operation_id) else {
            return Ok(ValidationResult::passing());
        };

        let entry = match options.status {
            Some(code) => find_status_code_match(code, &validators.response_headers),
            None => find_default_status_code_match(&validators.response_headers)
                .map(|(_, entry)| entry),
        };
        let Some(entry) = entry else {
            return Ok(ValidationResult::passing());
        };
        let validator = match options.set_match_type {
            SetMatchType::Any => &entry.any,
            SetMatchType::Superset => &entry.superset,
            SetMatchType::Subset => &entry.subset,
            SetMatchType::Exact => &entry.exact,
        };

        let mut lowered = Map::new();
        for (name, value) in headers {
            lowered.insert(name.to_lowercase(), value.clone());
        }
        let mut envelope = Map::new();
        envelope.insert("headers".to_string(), Value::Object(lowered));
        let input = Value::Object(envelope);

        let mut errors = Vec::new();
        collect_errors(validator, &input, &mut errors);
        Ok(ValidationResult::from_errors(errors))
    }
}

/// Cycle-break and compile one schema. Compile failures are fatal in strict
/// mode, otherwise the validator is skipped with a warning.
fn compile(
    schema: &Value,
    document: &Document,
    strict: bool,
    operation_id: &str,
    what: &str,
) -> EngineResult<Option<Arc<JSONSchema>>> {
    let broken = break_cycles(schema, document);
    match JSONSchema::compile(&broken) {
        Ok(compiled) => Ok(Some(Arc::new(compiled))),
        Err(e) => {
            let reason = format!("{what} schema for {operation_id}: {e}");
            if strict {
                return Err(EngineError::SchemaCompile(reason));
            }
            warn!(reason = %reason, "Skipping uncompilable schema");
            Ok(None)
        }
    }
}

fn collect_errors(validator: &JSONSchema, value: &Value, out: &mut Vec<ValidationErrorItem>) {
    if let Err(failures) = validator.validate(value) {
        for failure in failures {
            let schema_path = format!("#{}", failure.schema_path);
            let keyword = schema_path
                .rsplit('/')
                .find(|segment| {
                    !segment.is_empty()
                        && *segment != "#"
                        && !segment.chars().all(|c| c.is_ascii_digit())
                })
                .unwrap_or("schema")
                .to_string();
            out.push(ValidationErrorItem {
                keyword,
                instance_path: failure.instance_path.to_string(),
                schema_path,
                message: failure.to_string(),
            });
        }
    }
}

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Location where a parameter can be found in an HTTP request
///
/// Corresponds to the OpenAPI `in` field for parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// Path parameter (e.g., `/pets/{id}`)
    Path,
    /// Query string parameter (e.g., `?limit=10`)
    Query,
    /// HTTP header parameter
    Header,
    /// Cookie parameter
    Cookie,
}

impl ParameterLocation {
    /// Parse the OpenAPI `in` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    /// The OpenAPI `in` value, which doubles as the validation bucket key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialization style for parameters as defined by OpenAPI
///
/// Determines how array and object values are encoded in the different
/// parameter locations. See: <https://spec.openapis.org/oas/v3.0.3#style-values>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    /// Path-style parameters (e.g., `;color=blue;color=green`)
    Matrix,
    /// Label-style parameters with dot prefix (e.g., `.blue.green`)
    Label,
    /// Form-style parameters (default for query, e.g., `color=blue,green`)
    Form,
    /// Simple-style parameters (default for path/header, e.g., `blue,green`)
    Simple,
    /// Space-delimited arrays (e.g., `blue green`)
    SpaceDelimited,
    /// Pipe-delimited arrays (e.g., `blue|green`)
    PipeDelimited,
    /// Deep object parameters (e.g., `color[R]=100&color[G]=200`)
    DeepObject,
}

impl ParameterStyle {
    /// Parse the OpenAPI `style` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "matrix" => Some(ParameterStyle::Matrix),
            "label" => Some(ParameterStyle::Label),
            "form" => Some(ParameterStyle::Form),
            "simple" => Some(ParameterStyle::Simple),
            "spaceDelimited" => Some(ParameterStyle::SpaceDelimited),
            "pipeDelimited" => Some(ParameterStyle::PipeDelimited),
            "deepObject" => Some(ParameterStyle::DeepObject),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        };
        write!(f, "{s}")
    }
}

/// Metadata for a single parameter of an operation
///
/// Extracted from the OpenAPI parameter definition (with `$ref`s resolved)
/// and used for request parsing, coercion, and validator construction.
#[derive(Debug, Clone)]
pub struct ParameterMeta {
    /// Parameter name. Header names are stored lowercased.
    pub name: String,
    /// Where the parameter appears in the request
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
    /// JSON Schema for the parameter value
    pub schema: Option<Value>,
    /// Schema of `content["application/json"]`, when the parameter carries a
    /// JSON-encoded value instead of a plain schema
    pub content_json_schema: Option<Value>,
    /// Serialization style (how arrays/objects are encoded)
    pub style: Option<ParameterStyle>,
    /// Whether array/object values are exploded into repeated pairs
    pub explode: Option<bool>,
}

/// One alternative authorization requirement: scheme name to required scopes.
/// A requirement object authorizes only if every scheme in it succeeds.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// One `(method, path)` operation flattened out of the document
///
/// Built once at init with path-level parameters and document-level security
/// already merged in, and shared immutably from then on.
#[derive(Debug, Clone)]
pub struct Operation {
    /// HTTP method
    pub method: Method,
    /// Path template with `{name}` placeholders, relative to the api root
    pub path: String,
    /// `operationId`, when the document names the operation
    pub operation_id: Option<String>,
    /// Operation parameters merged with inherited path-level parameters.
    /// Operation-level definitions win on `(name, in)` conflicts.
    pub parameters: Vec<ParameterMeta>,
    /// The raw `requestBody` object, top-level `$ref` resolved
    pub request_body: Option<Value>,
    /// Responses keyed by status (`"200"`, `"2XX"`, `"default"`), top-level
    /// `$ref`s resolved, document order preserved
    pub responses: IndexMap<String, Value>,
    /// Effective security: operation override (even empty) beats the
    /// document default
    pub security: Vec<SecurityRequirement>,
}

impl Operation {
    /// The `content` map of the request body, if any.
    pub fn request_body_content(&self) -> Option<&serde_json::Map<String, Value>> {
        self.request_body
            .as_ref()
            .and_then(|body| body.get("content"))
            .and_then(Value::as_object)
    }

    /// Whether `application/json` is the only declared request media type.
    #[must_use]
    pub fn declares_only_json_body(&self) -> bool {
        self.request_body_content()
            .map(|content| content.len() == 1 && content.contains_key("application/json"))
            .unwrap_or(false)
    }

    /// The request body schema under `content["application/json"]`, if any.
    pub fn json_body_schema(&self) -> Option<&Value> {
        self.request_body_content()?
            .get("application/json")?
            .get("schema")
    }
}

/// The loaded OpenAPI document plus its flattened operation index.
///
/// The raw document keeps its internal `$ref`s; [`Document::resolve_ref`]
/// is the `$refs` index, resolving `#/...` pointers on demand. Downstream
/// components either resolve references through it or hand schemas to
/// [`crate::cycle::break_cycles`], which embeds them by value.
#[derive(Debug, Clone)]
pub struct Document {
    raw: Value,
    operations: Vec<Arc<Operation>>,
}

impl Document {
    /// Build the operation index for a decoded document.
    #[must_use]
    pub fn new(raw: Value) -> Self {
        let operations = super::build::build_operations(&raw);
        Document { raw, operations }
    }

    /// The decoded document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Resolve an internal `#/...` reference to the value it points at.
    pub fn resolve_ref(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(&self.raw);
        }
        self.raw.pointer(pointer)
    }

    /// All operations in document order.
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    /// Linear scan for the first operation with the given `operationId`.
    pub fn get_operation(&self, operation_id: &str) -> Option<Arc<Operation>> {
        self.operations
            .iter()
            .find(|op| op.operation_id.as_deref() == Some(operation_id))
            .cloned()
    }

    /// All `operationId`s declared by the document.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.operations
            .iter()
            .filter_map(|op| op.operation_id.as_deref())
    }

    /// Whether `components.securitySchemes` declares the named scheme.
    #[must_use]
    pub fn has_security_scheme(&self, name: &str) -> bool {
        self.raw
            .pointer("/components/securitySchemes")
            .and_then(Value::as_object)
            .map(|schemes| schemes.contains_key(name))
            .unwrap_or(false)
    }
}

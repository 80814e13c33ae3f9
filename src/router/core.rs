use super::request::{parse_cookies, parse_query_string, query_of_path, ParsedRequest, QueryInput, RawRequest};
use crate::error::{EngineError, EngineResult};
use crate::spec::{Document, Operation, ParameterLocation, ParameterStyle};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// One compiled route: the operation, its template regex, and a specificity
/// score for ordering template matches.
struct CompiledRoute {
    operation: Arc<Operation>,
    regex: Regex,
    specificity: usize,
}

/// Router that matches normalized requests against the operation index
///
/// Templates are compiled to anchored regexes at construction; matching
/// prefers exact path equality, then templates ordered by specificity (the
/// byte length of the template with all `{...}` placeholders removed),
/// longest first, document order on ties.
pub struct Router {
    document: Arc<Document>,
    routes: Vec<CompiledRoute>,
    api_root: String,
}

impl Router {
    /// Compile a router for all operations of the document.
    #[must_use]
    pub fn new(document: Arc<Document>, api_root: &str) -> Self {
        let routes: Vec<CompiledRoute> = document
            .operations()
            .iter()
            .map(|operation| {
                let (regex, _) = Self::path_to_regex(&operation.path);
                CompiledRoute {
                    specificity: Self::specificity(&operation.path),
                    operation: Arc::clone(operation),
                    regex,
                }
            })
            .collect();

        info!(
            routes_count = routes.len(),
            api_root = api_root,
            "Routing table compiled"
        );

        Router {
            document,
            routes,
            api_root: api_root.to_string(),
        }
    }

    /// The configured api root prefix.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// The document this router was compiled from.
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// Normalize a raw request: lowercase the method, strip the query string
    /// and trailing slashes from the path, and force a single leading slash.
    ///
    /// Idempotent, and never mutates the input.
    #[must_use]
    pub fn normalize_request(req: &RawRequest) -> RawRequest {
        let mut normalized = req.clone();
        normalized.method = req.method.to_lowercase();
        let path = req.path.split('?').next().unwrap_or("");
        let trimmed = path.trim_end_matches('/').trim_start_matches('/');
        normalized.path = format!("/{trimmed}");
        normalized
    }

    /// Strip the api root prefix from an already normalized path, leaving
    /// the route-relative path.
    #[must_use]
    pub fn normalize_path(&self, path: &str) -> String {
        if self.api_root == "/" {
            return path.to_string();
        }
        match path.strip_prefix(&self.api_root) {
            Some(rest) => {
                let rest = rest.trim_start_matches('/');
                if rest.is_empty() {
                    "/".to_string()
                } else {
                    format!("/{rest}")
                }
            }
            None => path.to_string(),
        }
    }

    fn path_within_root(&self, path: &str) -> bool {
        if self.api_root == "/" {
            return true;
        }
        path == self.api_root || path.starts_with(&format!("{}/", self.api_root))
    }

    /// Match a request to an operation, or `None` when nothing matches.
    #[must_use]
    pub fn match_operation(&self, req: &RawRequest) -> Option<Arc<Operation>> {
        self.match_operation_strict(req).ok()
    }

    /// Match a request to an operation.
    ///
    /// Failures carry the routing distinction: [`EngineError::NotFound`]
    /// when no path matches, [`EngineError::MethodNotAllowed`] when a path
    /// matches but the method does not.
    pub fn match_operation_strict(&self, req: &RawRequest) -> EngineResult<Arc<Operation>> {
        let normalized = Self::normalize_request(req);
        let method = normalized.method.as_str();

        if !self.path_within_root(&normalized.path) {
            return Err(EngineError::NotFound(format!(
                "{} is outside api root {}",
                normalized.path, self.api_root
            )));
        }
        let path = self.normalize_path(&normalized.path);

        // Exact path matches outrank template matches.
        for route in &self.routes {
            if route.operation.path == path && Self::method_matches(&route.operation, method) {
                return Ok(Arc::clone(&route.operation));
            }
        }

        let mut matching: Vec<&CompiledRoute> =
            self.routes.iter().filter(|r| r.regex.is_match(&path)).collect();
        if matching.is_empty() {
            return Err(EngineError::NotFound(format!(
                "no operation matches path {path}"
            )));
        }

        // Stable sort keeps document order on equal specificity.
        matching.sort_by(|a, b| b.specificity.cmp(&a.specificity));

        match matching
            .iter()
            .find(|r| Self::method_matches(&r.operation, method))
        {
            Some(route) => {
                debug!(
                    method = method,
                    path = %path,
                    template = %route.operation.path,
                    "Route matched"
                );
                Ok(Arc::clone(&route.operation))
            }
            None => Err(EngineError::MethodNotAllowed(format!(
                "method {method} not allowed on path {path}"
            ))),
        }
    }

    /// Parse a raw request into a [`ParsedRequest`].
    ///
    /// Decodes headers (lowercased), cookies, the query (from the supplied
    /// input or the original path), the body (strings get one JSON-parse
    /// attempt), path template captures, and the query-parameter style
    /// coercions of the operation, when one is given.
    #[must_use]
    pub fn parse_request(&self, req: &RawRequest, operation: Option<&Operation>) -> ParsedRequest {
        let normalized = Self::normalize_request(req);

        let mut headers = Map::new();
        for (name, value) in &req.headers {
            headers.insert(name.to_lowercase(), Value::String(value.clone()));
        }
        let cookies = parse_cookies(&headers);

        let mut query = match &req.query {
            Some(QueryInput::Map(map)) => map.clone(),
            Some(QueryInput::Raw(raw)) => parse_query_string(raw),
            None => query_of_path(&req.path).map(parse_query_string).unwrap_or_default(),
        };

        let body = req.body.as_ref().map(|body| match body {
            Value::String(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| body.clone())
            }
            other => other.clone(),
        });

        let path = self.normalize_path(&normalized.path);

        let mut params = Map::new();
        if let Some(operation) = operation {
            let (regex, param_names) = Self::path_to_regex(&operation.path);
            if let Some(captures) = regex.captures(&path) {
                for (index, name) in param_names.iter().enumerate() {
                    if let Some(capture) = captures.get(index + 1) {
                        params.insert(name.clone(), Value::String(capture.as_str().to_string()));
                    }
                }
            }
            Self::apply_query_styles(&mut query, operation);
        }

        ParsedRequest {
            method: normalized.method,
            path,
            params,
            query,
            headers,
            cookies,
            body,
        }
    }

    /// Apply declared query-parameter encodings to the decoded query map.
    ///
    /// Parameters with `content["application/json"]` get their raw string
    /// JSON-parsed; non-exploded parameters are split into arrays on the
    /// style's delimiter (comma for `form`, space for `spaceDelimited`,
    /// pipe for `pipeDelimited`).
    fn apply_query_styles(query: &mut Map<String, Value>, operation: &Operation) {
        for param in &operation.parameters {
            if param.location != ParameterLocation::Query {
                continue;
            }
            let Some(value) = query.get_mut(&param.name) else {
                continue;
            };
            if param.content_json_schema.is_some() {
                if let Value::String(text) = value {
                    if let Ok(parsed) = serde_json::from_str::<Value>(text) {
                        *value = parsed;
                    }
                }
            } else if param.explode == Some(false) {
                if let Value::String(text) = value {
                    *value = Self::split_unexploded(text, param.style);
                }
            }
        }
    }

    fn split_unexploded(value: &str, style: Option<ParameterStyle>) -> Value {
        let joined = match style {
            Some(ParameterStyle::SpaceDelimited) => {
                value.replace("%20", ",").replace(' ', ",")
            }
            Some(ParameterStyle::PipeDelimited) => {
                value.replace("%7C", ",").replace('|', ",")
            }
            _ => value.to_string(),
        };
        Value::Array(
            joined
                .split(',')
                .map(|part| Value::String(part.to_string()))
                .collect(),
        )
    }

    /// Specificity of a template: its byte length with every `{...}`
    /// placeholder removed. Longer fixed text wins.
    fn specificity(template: &str) -> usize {
        let mut length = 0;
        let mut in_placeholder = false;
        for c in template.chars() {
            match c {
                '{' => in_placeholder = true,
                '}' => in_placeholder = false,
                _ if !in_placeholder => length += c.len_utf8(),
                _ => {}
            }
        }
        length
    }

    fn method_matches(operation: &Operation, lowercased: &str) -> bool {
        operation.method.as_str().eq_ignore_ascii_case(lowercased)
    }

    /// Convert an OpenAPI path template to an anchored regex and the ordered
    /// parameter names it captures. Each `{name}` matches one non-slash
    /// segment.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<String>) {
        if path == "/" {
            return (
                Regex::new(r"^/$").expect("Failed to compile path regex"),
                Vec::new(),
            );
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let param_name = segment
                    .trim_start_matches('{')
                    .trim_end_matches('}')
                    .to_string();
                pattern.push_str("/([^/]+)");
                param_names.push(param_name);
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern).expect("Failed to compile path regex");

        (regex, param_names)
    }
}

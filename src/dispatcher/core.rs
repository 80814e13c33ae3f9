use crate::config::{Definition, EngineConfig};
use crate::error::{EngineError, EngineResult};
use crate::mock::{self, MockOptions};
use crate::router::{ParsedRequest, RawRequest, Router};
use crate::security::{is_truthy, SecurityHandler, SecurityReport};
use crate::spec::{load_document, validate_document, Document, Operation};
use crate::validator::{ResponseHeadersOptions, ValidationResult, ValidatorRegistry};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The fixed handler slots the engine falls back to.
pub const WELL_KNOWN_HANDLERS: [&str; 6] = [
    "notFound",
    "notImplemented",
    "methodNotAllowed",
    "validationFail",
    "unauthorizedHandler",
    "postResponseHandler",
];

/// An operation or well-known handler. The returned value is the response
/// the engine hands back to the transport.
pub type Handler = Box<dyn Fn(&Context) -> Value + Send + Sync>;

/// Per-request state passed to every handler
///
/// Built fresh for each `handle_request` call; nothing is shared between
/// requests.
#[derive(Debug, Clone)]
pub struct Context {
    /// The normalized, decoded request
    pub request: ParsedRequest,
    /// The matched operation, absent on routing fallbacks
    pub operation: Option<Arc<Operation>>,
    /// Request validation outcome; passing until validation runs
    pub validation: ValidationResult,
    /// Security handler results and the authorization verdict
    pub security: SecurityReport,
    /// The operation handler's response, visible to `postResponseHandler`
    pub response: Option<Value>,
}

struct EngineState {
    document: Arc<Document>,
    router: Router,
    validators: ValidatorRegistry,
}

/// The engine facade: owns the compiled contract, the handler registries,
/// and the request pipeline
///
/// Lifecycle is configure-then-serve: construct, `init`, register handlers,
/// then call [`Dispatcher::handle_request`] per request. Requests before
/// `init` fail with [`EngineError::NotInitialized`]. Compiled state is
/// immutable after init; only the registries mutate, and only through
/// `&mut self`.
pub struct Dispatcher {
    definition: Definition,
    config: EngineConfig,
    state: Option<EngineState>,
    handlers: HashMap<String, Handler>,
    security_handlers: HashMap<String, Box<dyn SecurityHandler>>,
}

impl Dispatcher {
    /// Create an un-initialized engine. Nothing is loaded until `init`.
    #[must_use]
    pub fn new(definition: Definition, config: EngineConfig) -> Self {
        Dispatcher {
            definition,
            config,
            state: None,
            handlers: HashMap::new(),
            security_handlers: HashMap::new(),
        }
    }

    /// Load the document, build the operation index, compile the router and
    /// all validators.
    ///
    /// Read and decode failures always propagate. Structural validation and
    /// schema compilation failures propagate in strict mode and are logged
    /// otherwise, leaving the engine partially usable.
    pub fn init(&mut self) -> EngineResult<()> {
        let document = Arc::new(load_document(
            &self.definition,
            self.config.strict,
            self.config.quick,
        )?);
        let router = Router::new(Arc::clone(&document), &self.config.api_root);
        let validators = ValidatorRegistry::build(Arc::clone(&document), self.config.strict)?;

        info!(
            operations = document.operations().len(),
            api_root = %self.config.api_root,
            strict = self.config.strict,
            "Engine initialized"
        );
        self.state = Some(EngineState {
            document,
            router,
            validators,
        });
        Ok(())
    }

    /// Whether `init` has completed.
    #[must_use]
    pub fn initialized(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> EngineResult<&EngineState> {
        self.state.as_ref().ok_or(EngineError::NotInitialized)
    }

    /// The loaded document.
    pub fn document(&self) -> EngineResult<&Arc<Document>> {
        Ok(&self.state()?.document)
    }

    /// The compiled router.
    pub fn router(&self) -> EngineResult<&Router> {
        Ok(&self.state()?.router)
    }

    /// All operations of the document.
    pub fn get_operations(&self) -> EngineResult<Vec<Arc<Operation>>> {
        Ok(self.state()?.document.operations().to_vec())
    }

    /// Look up an operation by `operationId`.
    pub fn get_operation(&self, operation_id: &str) -> EngineResult<Option<Arc<Operation>>> {
        Ok(self.state()?.document.get_operation(operation_id))
    }

    /// Whether the document declares the operation.
    pub fn operation_exists(&self, operation_id: &str) -> EngineResult<bool> {
        Ok(self.get_operation(operation_id)?.is_some())
    }

    /// Re-run the structural document validation.
    pub fn validate_definition(&self) -> EngineResult<()> {
        validate_document(self.state()?.document.raw()).map_err(EngineError::InvalidDefinition)
    }

    /// Register an operation or well-known handler.
    ///
    /// The id must be an `operationId` of the document or one of
    /// [`WELL_KNOWN_HANDLERS`]. Unknown ids error in strict mode and are
    /// registered with a warning otherwise. Re-registering replaces.
    pub fn register<F>(&mut self, id: &str, handler: F) -> EngineResult<()>
    where
        F: Fn(&Context) -> Value + Send + Sync + 'static,
    {
        self.register_handler(id, Box::new(handler))
    }

    /// Register an already boxed handler. Same rules as [`Dispatcher::register`].
    pub fn register_handler(&mut self, id: &str, handler: Handler) -> EngineResult<()> {
        let state = self.state.as_ref().ok_or(EngineError::NotInitialized)?;
        let known = WELL_KNOWN_HANDLERS.contains(&id)
            || state.document.operation_ids().any(|op_id| op_id == id);
        if !known {
            if self.config.strict {
                return Err(EngineError::UnknownHandlerId(id.to_string()));
            }
            warn!(handler_id = id, "Registering handler for unknown id");
        }
        if self.handlers.insert(id.to_string(), handler).is_some() {
            warn!(handler_id = id, "Replaced existing handler");
        } else {
            debug!(
                handler_id = id,
                total_handlers = self.handlers.len(),
                "Handler registered"
            );
        }
        Ok(())
    }

    /// Read a registered handler back.
    #[must_use]
    pub fn handler(&self, id: &str) -> Option<&Handler> {
        self.handlers.get(id)
    }

    /// Register a security handler for a scheme name.
    ///
    /// In strict mode the scheme must exist under
    /// `components.securitySchemes`.
    pub fn register_security_handler<H>(&mut self, name: &str, handler: H) -> EngineResult<()>
    where
        H: SecurityHandler + 'static,
    {
        let state = self.state.as_ref().ok_or(EngineError::NotInitialized)?;
        if !state.document.has_security_scheme(name) {
            if self.config.strict {
                return Err(EngineError::UnknownSecurityScheme(name.to_string()));
            }
            warn!(scheme = name, "Registering handler for undeclared security scheme");
        }
        self.security_handlers.insert(name.to_string(), Box::new(handler));
        Ok(())
    }

    /// Read a registered security handler back.
    #[must_use]
    pub fn security_handler(&self, name: &str) -> Option<&dyn SecurityHandler> {
        self.security_handlers.get(name).map(|h| h.as_ref())
    }

    /// Run the full request pipeline and return the selected handler's
    /// response (or the `postResponseHandler`'s, when registered).
    ///
    /// The pipeline: route, parse, run security, validate, resolve the
    /// handler. Routing misses select the `notFound`/`methodNotAllowed`
    /// fallback chains; an unauthorized request selects
    /// `unauthorizedHandler` when registered and otherwise proceeds, so
    /// operations can observe failed authentication; invalid requests
    /// select `validationFail` when registered.
    pub fn handle_request(&self, req: &RawRequest) -> EngineResult<Value> {
        let state = self.state()?;

        let (operation, routing_error) = match state.router.match_operation_strict(req) {
            Ok(operation) => (Some(operation), None),
            Err(e) => (None, Some(e)),
        };
        let parsed = state.router.parse_request(req, operation.as_deref());
        let mut ctx = Context {
            request: parsed,
            operation: operation.clone(),
            validation: ValidationResult::passing(),
            security: SecurityReport::default(),
            response: None,
        };

        let mut selected: Option<&str> = None;

        if let Some(error) = &routing_error {
            let chain: &[&'static str] = match error {
                EngineError::MethodNotAllowed(_) => {
                    &["methodNotAllowed", "notFound", "notImplemented"]
                }
                _ => &["notFound", "notImplemented"],
            };
            let fallback = self
                .first_registered(chain)
                .ok_or_else(|| EngineError::HandlerNotRegistered(chain[0].to_string()))?;
            debug!(handler_id = fallback, error = %error, "Routing fallback");
            selected = Some(fallback);
        }

        if let Some(operation) = &operation {
            ctx.security = self.run_security(&ctx, operation);
            if !ctx.security.authorized && self.handlers.contains_key("unauthorizedHandler") {
                selected = Some("unauthorizedHandler");
            }

            if selected.is_none() && self.config.validate.should_validate(&ctx) {
                ctx.validation = state.validators.validate_request(&ctx.request, operation);
                if !ctx.validation.valid && self.handlers.contains_key("validationFail") {
                    selected = Some("validationFail");
                }
            }

            if selected.is_none() {
                selected = match operation
                    .operation_id
                    .as_deref()
                    .filter(|id| self.handlers.contains_key(*id))
                {
                    Some(id) => Some(id),
                    None => Some(self.first_registered(&["notImplemented"]).ok_or_else(
                        || EngineError::HandlerNotRegistered("notImplemented".to_string()),
                    )?),
                };
            }
        }

        let selected = selected.expect("routing selects a handler or errors");
        let handler = self
            .handlers
            .get(selected)
            .expect("selected handler is registered");
        info!(
            handler_id = selected,
            method = %ctx.request.method,
            path = %ctx.request.path,
            authorized = ctx.security.authorized,
            valid = ctx.validation.valid,
            "Dispatching request"
        );
        ctx.response = Some(handler(&ctx));

        if let Some(post) = self.handlers.get("postResponseHandler") {
            return Ok(post(&ctx));
        }
        Ok(ctx.response.take().unwrap_or(Value::Null))
    }

    fn first_registered(&self, chain: &[&'static str]) -> Option<&'static str> {
        chain
            .iter()
            .copied()
            .find(|id| self.handlers.contains_key(*id))
    }

    /// Invoke the security handlers the operation's requirements name, once
    /// per distinct scheme, and compute the OR-of-ANDs verdict.
    fn run_security(&self, ctx: &Context, operation: &Operation) -> SecurityReport {
        if operation.security.is_empty() {
            return SecurityReport::default();
        }

        let mut results = Map::new();
        for requirement in &operation.security {
            for scheme in requirement.keys() {
                if results.contains_key(scheme) {
                    continue;
                }
                let value = match self.security_handlers.get(scheme) {
                    Some(handler) => handler.authenticate(ctx),
                    None => Value::Null,
                };
                results.insert(scheme.clone(), value);
            }
        }

        let authorized = operation.security.iter().any(|requirement| {
            requirement
                .keys()
                .all(|scheme| results.get(scheme).map(is_truthy).unwrap_or(false))
        });
        SecurityReport {
            results,
            authorized,
        }
    }

    /// Validate a request outside the pipeline.
    ///
    /// Resolves the operation by id when given, else through the router;
    /// a request that matches nothing, or an operation without an
    /// `operationId`, is an [`EngineError::UnknownOperation`].
    pub fn validate_request(
        &self,
        req: &RawRequest,
        operation_id: Option<&str>,
    ) -> EngineResult<ValidationResult> {
        let state = self.state()?;
        let operation = match operation_id {
            Some(id) => state
                .document
                .get_operation(id)
                .ok_or_else(|| EngineError::UnknownOperation(id.to_string()))?,
            None => {
                let operation = state.router.match_operation(req).ok_or_else(|| {
                    EngineError::UnknownOperation(format!("{} {}", req.method, req.path))
                })?;
                if operation.operation_id.is_none() {
                    return Err(EngineError::UnknownOperation(format!(
                        "{} {}",
                        req.method, req.path
                    )));
                }
                operation
            }
        };
        let parsed = state.router.parse_request(req, Some(&operation));
        Ok(state.validators.validate_request(&parsed, &operation))
    }

    /// Validate a parsed request against a specific operation.
    pub fn validate_parsed_request(
        &self,
        parsed: &ParsedRequest,
        operation: &Operation,
    ) -> EngineResult<ValidationResult> {
        Ok(self.state()?.validators.validate_request(parsed, operation))
    }

    /// Validate a response body. See [`ValidatorRegistry::validate_response`].
    pub fn validate_response(
        &self,
        response: &Value,
        operation_id: &str,
        status: Option<u16>,
    ) -> EngineResult<ValidationResult> {
        self.state()?
            .validators
            .validate_response(response, operation_id, status)
    }

    /// Validate response headers. See
    /// [`ValidatorRegistry::validate_response_headers`].
    pub fn validate_response_headers(
        &self,
        headers: &Map<String, Value>,
        operation_id: &str,
        options: &ResponseHeadersOptions,
    ) -> EngineResult<ValidationResult> {
        self.state()?
            .validators
            .validate_response_headers(headers, operation_id, options)
    }

    /// Synthesize a mock response for an operation from its examples or
    /// schemas.
    pub fn mock_response_for_operation(
        &self,
        operation_id: &str,
        options: &MockOptions,
    ) -> EngineResult<(u16, Value)> {
        mock::mock_response_for_operation(&self.state()?.document, operation_id, options)
    }
}

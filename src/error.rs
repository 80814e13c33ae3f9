//! Error types for the engine.
//!
//! All fallible public entry points return [`EngineResult`]. The `Display`
//! texts of the routing variants are stable: strict route matching surfaces
//! failures whose messages begin with `404-notFound:` and
//! `405-methodNotAllowed:`, which transports may pattern-match on.

use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;

/// Standard error type for the engine.
///
/// Contract errors (`InvalidDefinition`, `SchemaCompile`) are only returned
/// in strict mode; in non-strict mode they are logged and the engine stays
/// partially usable. Routing errors are returned by the strict router entry
/// points and converted to fallback-handler invocations inside the
/// dispatcher. Validation failures are never errors: they are reported in
/// `ValidationResult`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No operation matches the request path.
    #[error("404-notFound: {0}")]
    NotFound(String),

    /// The path matches but no operation accepts the request method.
    #[error("405-methodNotAllowed: {0}")]
    MethodNotAllowed(String),

    /// A request-serving entry point was called before `init`.
    #[error("engine not initialized")]
    NotInitialized,

    /// An operationId lookup failed, or a matched operation carries no id.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// `register` was called with an id that is neither an operationId nor a
    /// well-known handler slot (strict mode only).
    #[error("unknown handler id: {0}")]
    UnknownHandlerId(String),

    /// `register_security_handler` was called with a scheme name absent from
    /// `components.securitySchemes` (strict mode only).
    #[error("unknown security scheme: {0}")]
    UnknownSecurityScheme(String),

    /// A fallback-handler chain was exhausted without a registered handler.
    #[error("no handler registered for {0}")]
    HandlerNotRegistered(String),

    /// A mock was requested for an operation that declares no responses.
    #[error("no responses declared for operation: {0}")]
    NoResponses(String),

    /// The definition file could not be read.
    #[error("failed to read definition: {0}")]
    Io(#[from] std::io::Error),

    /// The definition could not be decoded or failed structural validation.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// A synthesized validator schema failed to compile (strict mode only).
    #[error("schema compilation failed: {0}")]
    SchemaCompile(String),
}

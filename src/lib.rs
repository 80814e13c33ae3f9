//! # oasgate
//!
//! A framework-agnostic backend engine driven by an OpenAPI 3.0 contract.
//! Given a request, the engine matches it to an operation declared in the
//! contract, validates its parameters and body, runs the declared security
//! requirements through pluggable handlers, and dispatches to a registered
//! operation handler - or synthesizes a mock response straight from the
//! contract's examples and schemas.
//!
//! Transports stay outside: adapt your framework's request into
//! [`RawRequest`], hand it to [`Dispatcher::handle_request`], and interpret
//! the returned JSON value however your framework responds.

pub mod config;
pub mod cycle;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod router;
pub mod security;
pub mod spec;
pub mod status;
pub mod validator;

pub use config::{Definition, EngineConfig, ValidationMode};
pub use dispatcher::{Context, Dispatcher, Handler, WELL_KNOWN_HANDLERS};
pub use error::{EngineError, EngineResult};
pub use mock::{example_from_schema, mock_response_for_operation, MockOptions};
pub use router::{ParsedRequest, QueryInput, RawRequest, Router};
pub use security::{SecurityHandler, SecurityReport};
pub use spec::{
    Document,
    Operation,
    ParameterLocation,
    ParameterMeta,
    ParameterStyle,
    SecurityRequirement,
};
pub use status::{find_default_status_code_match, find_status_code_match};
pub use validator::{
    ResponseHeadersOptions,
    SetMatchType,
    ValidationErrorItem,
    ValidationResult,
    ValidatorRegistry,
};

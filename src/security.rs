//! # Security Module
//!
//! Pluggable authentication for the security requirements a document
//! declares.
//!
//! ## Overview
//!
//! The engine does not ship concrete authenticators. Callers register a
//! [`SecurityHandler`] per scheme name; during `handle_request` the
//! dispatcher invokes the handler of every scheme referenced by the matched
//! operation's requirements and records the returned value in the request
//! context. A truthy return authenticates the scheme; the value itself -
//! claims, a session, an id - is exposed to handlers at
//! `context.security.results[scheme]`.
//!
//! ## Authorization semantics
//!
//! OpenAPI `security` is a list of alternative requirement objects:
//! OR-of-ANDs. The request is authorized when at least one requirement
//! object has every one of its schemes authenticated. An empty `security`
//! list means there is nothing to satisfy and the request is authorized.
//!
//! ## Example
//!
//! ```rust,ignore
//! engine.register_security_handler("basicAuth", |ctx: &Context| {
//!     match ctx.request.headers.get("authorization") {
//!         Some(header) => serde_json::json!({ "user": check(header) }),
//!         None => serde_json::Value::Null,
//!     }
//! })?;
//! ```

use crate::dispatcher::Context;
use serde::Serialize;
use serde_json::{Map, Value};

/// Authenticates one security scheme for a request.
///
/// Any closure `Fn(&Context) -> Value + Send + Sync` is a handler. Return a
/// truthy value to authenticate; the value is stored in the context for the
/// operation handler to inspect.
pub trait SecurityHandler: Send + Sync {
    /// Authenticate the request, returning the scheme's result value.
    fn authenticate(&self, ctx: &Context) -> Value;
}

impl<F> SecurityHandler for F
where
    F: Fn(&Context) -> Value + Send + Sync,
{
    fn authenticate(&self, ctx: &Context) -> Value {
        self(ctx)
    }
}

/// Outcome of running the security requirements for a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityReport {
    /// Per-scheme handler results; `null` for schemes with no handler
    pub results: Map<String, Value>,
    /// Whether some requirement object was fully satisfied
    pub authorized: bool,
}

impl Default for SecurityReport {
    /// A request with no security to run is authorized.
    fn default() -> Self {
        SecurityReport {
            results: Map::new(),
            authorized: true,
        }
    }
}

/// JSON truthiness: `null`, `false`, `0`, and `""` are falsy, everything
/// else truthy. Mirrors how handler results gate authentication in the
/// original engine.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

//! # Dispatcher Module
//!
//! The engine facade and the request pipeline.
//!
//! ## Overview
//!
//! [`Dispatcher`] owns everything built from the contract - document,
//! operation index, router, compiled validators - plus the two registries
//! callers fill in: operation/well-known handlers and security handlers.
//!
//! ## Request Flow
//!
//! 1. Router matches the request to an operation (or a 404/405 outcome)
//! 2. The request is parsed into its decoded shape
//! 3. Security requirements run through the registered security handlers
//! 4. The request is validated against the operation's compiled validators
//! 5. The handler is resolved: the operation's own, or a fallback
//!    (`notFound`, `methodNotAllowed`, `notImplemented`, `validationFail`,
//!    `unauthorizedHandler`)
//! 6. The handler's response is returned, via `postResponseHandler` when one
//!    is registered
//!
//! Handlers all share one shape: `Fn(&Context) -> Value`. Handler resolution
//! is a table lookup, not dispatch over a trait hierarchy.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oasgate::{Definition, Dispatcher, EngineConfig};
//! use serde_json::json;
//!
//! let mut engine = Dispatcher::new(Definition::File("openapi.yaml".into()),
//!                                  EngineConfig::default());
//! engine.init()?;
//! engine.register("listPets", |ctx| json!({ "pets": [], "query": ctx.request.query }))?;
//! engine.register("notFound", |_| json!({ "error": "not found" }))?;
//!
//! let response = engine.handle_request(&request)?;
//! ```

mod core;

pub use core::{Context, Dispatcher, Handler, WELL_KNOWN_HANDLERS};

//! # Spec Module
//!
//! OpenAPI 3.0 document loading and indexing. The document is decoded from
//! YAML/JSON into a JSON value, optionally validated against the typed
//! `oas3` model, and flattened into an operation index the router, the
//! validators, and the mock engine work from.
//!
//! ## Overview
//!
//! This module is responsible for:
//! - Loading definitions from files or inline values
//! - Structural validation (strict mode) and the OpenAPI 3.0 version gate
//! - Flattening `paths` x methods into [`Operation`] records
//! - Merging inherited path-level parameters and document-level security
//! - Resolving internal `$ref`s on demand via [`Document::resolve_ref`]
//!
//! ## Key Types
//!
//! - [`Document`] - the decoded document plus its operation index
//! - [`Operation`] - one `(method, path)` pair with merged metadata
//! - [`ParameterMeta`] - parameter name, location, schema, style
//!
//! ## Example
//!
//! ```rust,ignore
//! use oasgate::spec::{load_document, Definition};
//!
//! let doc = load_document(&Definition::File("openapi.yaml".into()), false, false)?;
//! for op in doc.operations() {
//!     println!("{} {}", op.method, op.path);
//! }
//! ```

mod build;
mod load;
mod types;

pub use load::{load_definition, load_document, validate_document};
pub use types::{
    Document, Operation, ParameterLocation, ParameterMeta, ParameterStyle, SecurityRequirement,
};

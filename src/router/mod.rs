//! # Router Module
//!
//! Request normalization, operation matching, and request parsing.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Normalizing inbound requests (method case, slashes, query stripping)
//! - Stripping the configured api root prefix
//! - Matching requests to operations, exact paths first, then templates
//!   ordered by specificity
//! - Parsing requests into the decoded shape handlers and validators use
//!
//! ## Matching
//!
//! OpenAPI templates (`/pets/{id}`) are compiled into anchored regexes at
//! construction, one per operation. Matching prefers an exact path-and-method
//! hit; otherwise template matches are ordered by the length of their fixed
//! text, longest first, with document order breaking ties. A path match with
//! no acceptable method is a `405`, everything else a `404` - the strict
//! entry point surfaces the distinction as typed errors, the dispatcher
//! turns them into fallback handlers.

mod core;
mod request;

pub use core::Router;
pub use request::{parse_cookies, parse_query_string, ParsedRequest, QueryInput, RawRequest};

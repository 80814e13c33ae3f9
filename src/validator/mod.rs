//! # Validator Module
//!
//! Per-operation request, response, and response-header validation.
//!
//! ## Overview
//!
//! At init every operation with an `operationId` gets four validator
//! families compiled from its schemas:
//!
//! - request validators: the body envelope (when a JSON body is declared)
//!   followed by the four-bucket parameter envelope
//! - one combined `oneOf` response validator
//! - individual response validators keyed by status
//! - response-header validators keyed by status, in the four
//!   [`SetMatchType`] flavors
//!
//! Every schema is passed through the cycle breaker before compilation, so
//! self-referential documents compile into validators with internal
//! pointers instead of diverging.
//!
//! ## Runtime
//!
//! Request validation assembles one composite input from the parsed request
//! - `{ path, query, header, cookie, requestBody }` - with parameter values
//! coerced to their declared types first, then runs every validator in
//! order, accumulating failures. Results are data ([`ValidationResult`]),
//! never errors; only programmer mistakes (unknown operationId) error.

mod coerce;
mod core;
mod schemas;

pub use core::{ResponseHeadersOptions, ValidationErrorItem, ValidationResult, ValidatorRegistry};
pub use schemas::SetMatchType;

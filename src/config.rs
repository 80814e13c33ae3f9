//! # Engine Configuration
//!
//! Construction-time options for [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! ## Overview
//!
//! The engine is configured once, before `init`:
//!
//! - `api_root` - path prefix all routes live under (default `/`)
//! - `strict` - turn contract problems and registration mistakes into errors
//!   instead of warnings
//! - `quick` - skip structural validation of the document at load time
//! - `validate` - whether request validation runs, globally or per request
//!
//! The configuration is moved into the engine; callers keep no shared
//! handle to it, so post-construction mutation from outside is impossible.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oasgate::{Definition, Dispatcher, EngineConfig};
//!
//! let config = EngineConfig {
//!     api_root: "/api/v1".to_string(),
//!     strict: true,
//!     ..EngineConfig::default()
//! };
//! let mut engine = Dispatcher::new(Definition::File("openapi.yaml".into()), config);
//! engine.init()?;
//! ```

use crate::dispatcher::Context;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the OpenAPI document comes from.
///
/// Remote (URL) definitions are the responsibility of the caller: fetch the
/// document, decode it, and pass it as [`Definition::Inline`].
#[derive(Debug, Clone)]
pub enum Definition {
    /// A YAML (`.yaml`/`.yml`) or JSON file on disk.
    File(PathBuf),
    /// An already decoded document.
    Inline(Value),
}

/// Controls when request validation runs inside `handle_request`.
#[derive(Clone)]
pub enum ValidationMode {
    /// Validate every request (default).
    Enabled,
    /// Never validate.
    Disabled,
    /// Decide per request from the routed context.
    Predicate(Arc<dyn Fn(&Context) -> bool + Send + Sync>),
}

impl ValidationMode {
    /// Whether validation should run for the given request context.
    pub fn should_validate(&self, ctx: &Context) -> bool {
        match self {
            ValidationMode::Enabled => true,
            ValidationMode::Disabled => false,
            ValidationMode::Predicate(predicate) => predicate(ctx),
        }
    }
}

impl std::fmt::Debug for ValidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationMode::Enabled => write!(f, "Enabled"),
            ValidationMode::Disabled => write!(f, "Disabled"),
            ValidationMode::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// Engine options.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path prefix the API is mounted under. Requests outside it never match.
    pub api_root: String,
    /// Escalate contract problems and registration mistakes to errors.
    pub strict: bool,
    /// Skip the structural document validation pass at `init`.
    pub quick: bool,
    /// Request validation policy.
    pub validate: ValidationMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            api_root: "/".to_string(),
            strict: false,
            quick: false,
            validate: ValidationMode::Enabled,
        }
    }
}

//! Definition loading from files and the strict/quick init split.

mod common;

use oasgate::{Definition, Dispatcher, EngineConfig, EngineError};
use std::io::Write;

const YAML_SPEC: &str = r#"
openapi: 3.0.0
info:
  title: Minimal
  version: 1.0.0
paths:
  /ping:
    get:
      operationId: ping
      responses:
        "200":
          description: pong
"#;

fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_load_yaml_file() {
    let file = write_temp(YAML_SPEC, ".yaml");
    let mut engine = Dispatcher::new(
        Definition::File(file.path().to_path_buf()),
        EngineConfig {
            strict: true,
            ..EngineConfig::default()
        },
    );
    engine.init().unwrap();
    assert!(engine.operation_exists("ping").unwrap());
}

#[test]
fn test_load_json_file() {
    let json_spec = serde_json::to_string(&common::petstore()).unwrap();
    let file = write_temp(&json_spec, ".json");
    let mut engine = Dispatcher::new(
        Definition::File(file.path().to_path_buf()),
        EngineConfig::default(),
    );
    engine.init().unwrap();
    assert!(engine.operation_exists("listPets").unwrap());
}

#[test]
fn test_missing_file_errors() {
    let mut engine = Dispatcher::new(
        Definition::File("/nonexistent/openapi.yaml".into()),
        EngineConfig::default(),
    );
    assert!(matches!(engine.init(), Err(EngineError::Io(_))));
}

#[test]
fn test_undecodable_file_errors_even_when_lax() {
    let file = write_temp("{ this is not json", ".json");
    let mut engine = Dispatcher::new(
        Definition::File(file.path().to_path_buf()),
        EngineConfig::default(),
    );
    assert!(matches!(engine.init(), Err(EngineError::InvalidDefinition(_))));
}

#[test]
fn test_strict_vs_quick_on_wrong_version() {
    let doc = serde_json::json!({ "openapi": "3.1.0", "paths": {} });

    let mut strict = Dispatcher::new(
        Definition::Inline(doc.clone()),
        EngineConfig {
            strict: true,
            ..EngineConfig::default()
        },
    );
    assert!(matches!(strict.init(), Err(EngineError::InvalidDefinition(_))));

    // Non-strict warns and proceeds; quick never looks.
    let mut lax = Dispatcher::new(Definition::Inline(doc.clone()), EngineConfig::default());
    lax.init().unwrap();

    let mut quick = Dispatcher::new(
        Definition::Inline(doc),
        EngineConfig {
            strict: true,
            quick: true,
            ..EngineConfig::default()
        },
    );
    quick.init().unwrap();
    assert!(quick.initialized());

    // The explicit re-check still reports the problem.
    assert!(matches!(
        quick.validate_definition(),
        Err(EngineError::InvalidDefinition(_))
    ));
}

//! Engine pipeline tests: lifecycle, fallback-handler chains, handler
//! resolution, and the post-response hook.

mod common;

use common::{engine, engine_with, request, request_with_query};
use oasgate::{Definition, Dispatcher, EngineConfig, EngineError, MockOptions, ValidationMode};
use serde_json::json;

#[test]
fn test_requests_before_init_fail() {
    let uninitialized = Dispatcher::new(
        Definition::Inline(common::petstore()),
        EngineConfig::default(),
    );
    let err = uninitialized.handle_request(&request("GET", "/pets")).unwrap_err();
    assert!(matches!(err, EngineError::NotInitialized));
    assert_eq!(err.to_string(), "engine not initialized");
    assert!(!uninitialized.initialized());
}

#[test]
fn test_operation_handler_receives_context() {
    let mut engine = engine();
    engine
        .register("listPets", |ctx| {
            json!({
                "limit": ctx.request.query.get("limit"),
                "valid": ctx.validation.valid
            })
        })
        .unwrap();

    let response = engine
        .handle_request(&request_with_query("GET", "/pets", "limit=5"))
        .unwrap();
    // The parsed request keeps raw string values; coercion is validation-side.
    assert_eq!(response, json!({ "limit": "5", "valid": true }));
}

#[test]
fn test_method_not_allowed_fallback_chain() {
    // With methodNotAllowed registered, it handles the miss.
    {
        let mut engine = engine();
        engine.register("methodNotAllowed", |_| json!("405")).unwrap();
        engine.register("notFound", |_| json!("404")).unwrap();
        engine.register("notImplemented", |_| json!("501")).unwrap();
        let response = engine.handle_request(&request("DELETE", "/pets")).unwrap();
        assert_eq!(response, json!("405"));
    }

    // Without it, notFound takes over.
    {
        let mut engine = engine();
        engine.register("notFound", |_| json!("404")).unwrap();
        engine.register("notImplemented", |_| json!("501")).unwrap();
        let response = engine.handle_request(&request("DELETE", "/pets")).unwrap();
        assert_eq!(response, json!("404"));
    }

    // Then notImplemented.
    {
        let mut engine = engine();
        engine.register("notImplemented", |_| json!("501")).unwrap();
        let response = engine.handle_request(&request("DELETE", "/pets")).unwrap();
        assert_eq!(response, json!("501"));
    }

    // With nothing registered the chain is an error naming the slot.
    {
        let engine = engine();
        let err = engine.handle_request(&request("DELETE", "/pets")).unwrap_err();
        assert!(matches!(err, EngineError::HandlerNotRegistered(_)));
        assert!(err.to_string().contains("methodNotAllowed"));
    }
}

#[test]
fn test_not_found_fallback() {
    let mut engine = engine();
    engine.register("notFound", |ctx| {
        assert!(ctx.operation.is_none());
        json!("404")
    }).unwrap();
    let response = engine.handle_request(&request("GET", "/rockets")).unwrap();
    assert_eq!(response, json!("404"));
}

#[test]
fn test_unregistered_operation_falls_back_to_not_implemented() {
    let mut engine = engine();
    engine.register("notImplemented", |_| json!("501")).unwrap();
    let response = engine
        .handle_request(&request_with_query("GET", "/pets", "limit=1"))
        .unwrap();
    assert_eq!(response, json!("501"));
}

#[test]
fn test_validation_fail_handler() {
    let mut engine = engine();
    engine.register("listPets", |_| json!("pets")).unwrap();
    engine
        .register("validationFail", |ctx| {
            json!({ "errors": ctx.validation.errors.as_ref().map(|e| e.len()) })
        })
        .unwrap();

    // Required query parameter `limit` missing.
    let response = engine.handle_request(&request("GET", "/pets")).unwrap();
    assert!(response.get("errors").is_some());

    // A valid request goes to the operation handler.
    let response = engine
        .handle_request(&request_with_query("GET", "/pets", "limit=3"))
        .unwrap();
    assert_eq!(response, json!("pets"));
}

#[test]
fn test_invalid_request_without_validation_fail_handler_proceeds() {
    let mut engine = engine();
    engine
        .register("listPets", |ctx| json!({ "valid": ctx.validation.valid }))
        .unwrap();
    let response = engine.handle_request(&request("GET", "/pets")).unwrap();
    assert_eq!(response, json!({ "valid": false }));
}

#[test]
fn test_validation_disabled() {
    let mut engine = engine_with(EngineConfig {
        validate: ValidationMode::Disabled,
        ..EngineConfig::default()
    });
    engine
        .register("listPets", |ctx| json!({ "valid": ctx.validation.valid }))
        .unwrap();
    // Invalid request, but validation never runs.
    let response = engine.handle_request(&request("GET", "/pets")).unwrap();
    assert_eq!(response, json!({ "valid": true }));
}

#[test]
fn test_validation_predicate() {
    let mut engine = engine_with(EngineConfig {
        validate: ValidationMode::Predicate(std::sync::Arc::new(|ctx: &oasgate::Context| {
            ctx.request.path != "/pets"
        })),
        ..EngineConfig::default()
    });
    engine
        .register("listPets", |ctx| json!({ "valid": ctx.validation.valid }))
        .unwrap();
    let response = engine.handle_request(&request("GET", "/pets")).unwrap();
    assert_eq!(response, json!({ "valid": true }));
}

#[test]
fn test_post_response_handler_wraps_result() {
    let mut engine = engine();
    engine.register("getPetsMeta", |_| json!({ "version": 2 })).unwrap();
    engine
        .register("postResponseHandler", |ctx| {
            json!({ "wrapped": ctx.response })
        })
        .unwrap();
    let response = engine.handle_request(&request("GET", "/pets/meta")).unwrap();
    assert_eq!(response, json!({ "wrapped": { "version": 2 } }));
}

#[test]
fn test_register_unknown_id() {
    // Strict mode refuses, naming the id.
    let mut strict = engine_with(EngineConfig {
        strict: true,
        ..EngineConfig::default()
    });
    let err = strict.register("fetchRockets", |_| json!(null)).unwrap_err();
    assert!(matches!(err, EngineError::UnknownHandlerId(_)));
    assert!(err.to_string().contains("fetchRockets"));

    // Non-strict warns and registers anyway.
    let mut lax = engine();
    lax.register("fetchRockets", |_| json!(null)).unwrap();
    assert!(lax.handler("fetchRockets").is_some());
}

#[test]
fn test_handler_read_back_round_trip() {
    let mut engine = engine();
    engine.register("getPetsMeta", |_| json!(1)).unwrap();
    let handler = engine.handler("getPetsMeta").expect("registered handler");
    let parsed = engine
        .router()
        .unwrap()
        .parse_request(&request("GET", "/pets/meta"), None);
    let ctx = oasgate::Context {
        request: parsed,
        operation: None,
        validation: oasgate::ValidationResult::passing(),
        security: oasgate::SecurityReport::default(),
        response: None,
    };
    assert_eq!(handler(&ctx), json!(1));
    assert!(engine.handler("listPets").is_none());
}

#[test]
fn test_operation_index_accessors() {
    let engine = engine();
    assert!(engine.operation_exists("createPet").unwrap());
    assert!(!engine.operation_exists("fetchRockets").unwrap());
    let ops = engine.get_operations().unwrap();
    assert_eq!(ops.len(), 5);
    let op = engine.get_operation("getPetById").unwrap().unwrap();
    assert_eq!(op.path, "/pets/{id}");
}

#[test]
fn test_mock_through_engine() {
    let engine = engine();
    let (status, mock) = engine
        .mock_response_for_operation("createPet", &MockOptions::default())
        .unwrap();
    assert_eq!(status, 201);
    assert_eq!(mock, json!({ "id": 1, "name": "Garfield" }));
}

#[test]
fn test_api_root_routing() {
    let mut engine = {
        let mut e = Dispatcher::new(
            Definition::Inline(common::petstore()),
            EngineConfig {
                api_root: "/api/v1".to_string(),
                ..EngineConfig::default()
            },
        );
        e.init().unwrap();
        e
    };
    engine.register("getPetsMeta", |_| json!("meta")).unwrap();
    engine.register("notFound", |_| json!("404")).unwrap();

    let response = engine
        .handle_request(&request("GET", "/api/v1/pets/meta"))
        .unwrap();
    assert_eq!(response, json!("meta"));

    let response = engine.handle_request(&request("GET", "/pets/meta")).unwrap();
    assert_eq!(response, json!("404"));
}

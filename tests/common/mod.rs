#![allow(dead_code)]

use oasgate::{Definition, Dispatcher, EngineConfig, QueryInput, RawRequest};
use serde_json::{json, Value};
use std::collections::HashMap;

/// A pet-store style document exercising parameters, bodies, security,
/// response headers, and wildcard statuses.
pub fn petstore() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": { "title": "Pet Store", "version": "1.0.0" },
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [
                        { "name": "limit", "in": "query", "required": true,
                          "schema": { "type": "integer", "minimum": 1 } },
                        { "name": "tags", "in": "query", "style": "form", "explode": false,
                          "schema": { "type": "array", "items": { "type": "string" } } }
                    ],
                    "responses": {
                        "200": {
                            "description": "pets",
                            "headers": {
                                "X-Total-Count": { "schema": { "type": "integer" } }
                            },
                            "content": { "application/json": { "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Pet" }
                            } } }
                        },
                        "4XX": {
                            "description": "client error",
                            "content": { "application/json": { "schema": {
                                "$ref": "#/components/schemas/Error"
                            } } }
                        }
                    }
                },
                "post": {
                    "operationId": "createPet",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": {
                            "type": "object",
                            "required": ["name"],
                            "properties": {
                                "name": { "type": "string" },
                                "tag": { "type": "string" }
                            }
                        } } }
                    },
                    "responses": {
                        "201": { "description": "created",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": {
                                    "id": { "type": "integer", "minimum": 1 },
                                    "name": { "type": "string", "example": "Garfield" }
                                }
                            } } }
                        }
                    }
                }
            },
            "/pets/{id}": {
                "get": {
                    "operationId": "getPetById",
                    "parameters": [
                        { "name": "id", "in": "path", "required": true,
                          "schema": { "type": "integer" } }
                    ],
                    "responses": {
                        "200": { "description": "a pet",
                            "content": { "application/json": { "schema": {
                                "$ref": "#/components/schemas/Pet"
                            } } }
                        },
                        "default": { "description": "error",
                            "content": { "application/json": { "schema": {
                                "$ref": "#/components/schemas/Error"
                            } } }
                        }
                    }
                }
            },
            "/pets/meta": {
                "get": {
                    "operationId": "getPetsMeta",
                    "responses": { "200": { "description": "meta" } }
                }
            },
            "/secure": {
                "get": {
                    "operationId": "secureOp",
                    "security": [ { "basicAuth": [] } ],
                    "responses": { "200": { "description": "ok" } }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "basicAuth": { "type": "http", "scheme": "basic" }
            },
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" }
                    }
                },
                "Error": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" }
                    },
                    "additionalProperties": false
                }
            }
        }
    })
}

pub fn engine_with(config: EngineConfig) -> Dispatcher {
    let mut engine = Dispatcher::new(Definition::Inline(petstore()), config);
    engine.init().expect("engine init");
    engine
}

pub fn engine() -> Dispatcher {
    engine_with(EngineConfig::default())
}

pub fn request(method: &str, path: &str) -> RawRequest {
    RawRequest {
        method: method.to_string(),
        path: path.to_string(),
        ..RawRequest::default()
    }
}

pub fn request_with_body(method: &str, path: &str, body: Value) -> RawRequest {
    let mut req = request(method, path);
    req.headers = HashMap::from([(
        "Content-Type".to_string(),
        "application/json".to_string(),
    )]);
    req.body = Some(body);
    req
}

pub fn request_with_query(method: &str, path: &str, query: &str) -> RawRequest {
    let mut req = request(method, path);
    req.query = Some(QueryInput::Raw(query.to_string()));
    req
}

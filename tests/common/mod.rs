#![allow(dead_code)]

use std::sync::Once;

use oapiglue::mount::{RouteBinding, RouteRegistrar};
use oapiglue::resolver::Controller;
use oapiglue::spec::SharedSchema;
use oapiglue::{Handler, HandlerResponse};
use serde_json::{json, Value};

static TRACING_INIT: Once = Once::new();

/// Route test logs through tracing-subscriber once per test binary.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Pet-store style document exercising component schemas, parameter
/// locations, request bodies, and response mapping.
///
/// Expected route order: GET /pet, POST /pet, GET /pet/{petId},
/// DELETE /pet/{petId}, GET /user/{name}.
pub fn petstore_doc() -> Value {
    json!({
        "openapi": "3.0.2",
        "info": { "title": "Pet store", "version": "1.0.0" },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" },
                        "tag": { "$ref": "#/components/schemas/Tag" }
                    }
                },
                "Tag": { "type": "string" },
                "Error": {
                    "type": "object",
                    "properties": { "message": { "type": "string" } }
                }
            }
        },
        "paths": {
            "/pet": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "format": "int32" } }
                    ],
                    "responses": {
                        "200": {
                            "description": "a page of pets",
                            "content": { "application/json": { "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Pet" }
                            }}}
                        },
                        "default": {
                            "description": "unexpected error",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Error" } } }
                        }
                    }
                },
                "post": {
                    "operationId": "createPet",
                    "requestBody": {
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
                    },
                    "responses": {
                        "201": {
                            "description": "created",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": { "id": { "type": "integer", "format": "int64" } }
                            }}}
                        }
                    }
                }
            },
            "/pet/{petId}": {
                "parameters": [
                    { "name": "petId", "in": "path", "required": true, "schema": { "type": "integer" } }
                ],
                "get": {
                    "operationId": "getPetById",
                    "responses": {
                        "200": {
                            "description": "one pet",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
                        }
                    }
                },
                "delete": {
                    "responses": { "204": { "description": "gone" } }
                }
            },
            "/user/{name}": {
                "get": {
                    "parameters": [
                        { "name": "name", "in": "path", "required": true, "schema": { "type": "string" } }
                    ],
                    "responses": { "200": { "description": "ok" } }
                }
            }
        }
    })
}

/// Document with a single wildcard route `GET /files/{path}`.
pub fn wildcard_doc() -> Value {
    json!({
        "openapi": "3.1.0",
        "info": { "title": "Files", "version": "1.0.0" },
        "paths": {
            "/files/{path}": {
                "get": {
                    "operationId": "getFile",
                    "parameters": [
                        {
                            "name": "path",
                            "in": "path",
                            "required": true,
                            "x-wildcard": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": { "200": { "description": "ok" } }
                }
            }
        }
    })
}

/// Controller answering 200 with `{"operation": <id>}` for each given id.
pub fn controller(operations: &[&str]) -> Controller {
    let mut controller = Controller::new();
    for operation in operations {
        let name = operation.to_string();
        let body_name = name.clone();
        controller.insert(
            name,
            Handler::new(move |_req| {
                HandlerResponse::json(200, json!({ "operation": body_name }))
            }),
        );
    }
    controller
}

/// Registrar that records everything it is handed, in call order.
#[derive(Default)]
pub struct RecordingRegistrar {
    pub shared: Vec<SharedSchema>,
    pub bindings: Vec<RouteBinding>,
    pub events: Vec<String>,
}

impl RouteRegistrar for RecordingRegistrar {
    fn add_shared_schema(&mut self, shared: &SharedSchema) -> anyhow::Result<()> {
        self.events.push("shared".to_string());
        self.shared.push(shared.clone());
        Ok(())
    }

    fn register_route(&mut self, binding: RouteBinding) -> anyhow::Result<()> {
        self.events
            .push(format!("{} {}", binding.method, binding.url));
        self.bindings.push(binding);
        Ok(())
    }
}

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::RecordingRegistrar;
use oapiglue::mount::{bind_handlers, mount, register_routes, MountOptions};
use oapiglue::resolver::ResolverOptions;
use oapiglue::spec::{compile, OpenApiDocument};
use oapiglue::HandlerRequest;
use serde_json::json;

fn petstore_resolver() -> ResolverOptions {
    ResolverOptions::new().with_controller(common::controller(&[
        "listPets",
        "createPet",
        "getPetById",
        "deletePetByPetId",
        "getUserByName",
    ]))
}

#[test]
fn mount_registers_shared_schema_then_routes_in_order() {
    common::init_tracing();
    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::inline(common::petstore_doc()).with_resolver(petstore_resolver());

    let config = mount(&mut registrar, &options).unwrap();

    assert_eq!(
        registrar.events,
        vec![
            "shared",
            "GET /pet",
            "POST /pet",
            "GET /pet/:petId",
            "DELETE /pet/:petId",
            "GET /user/:name",
        ]
    );
    assert!(registrar.shared[0].definitions.contains_key("Pet"));
    assert!(config.routes.iter().all(|route| route.handler.is_some()));
}

#[test]
fn registered_handlers_answer_through_the_binding() {
    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::inline(common::petstore_doc()).with_resolver(petstore_resolver());
    mount(&mut registrar, &options).unwrap();

    let binding = &registrar.bindings[0];
    let response = binding
        .handler
        .call(HandlerRequest::new(binding.method.clone(), "/pet"));
    assert_eq!(response.status, 200);
    assert_eq!(response.body["operation"], "listPets");
}

#[test]
fn response_formats_are_stripped_at_registration_only() {
    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::inline(common::petstore_doc()).with_resolver(petstore_resolver());
    let config = mount(&mut registrar, &options).unwrap();

    // createPet's 201 response declares an int64 id inline.
    let binding = registrar
        .bindings
        .iter()
        .find(|binding| binding.operation_id == "createPet")
        .unwrap();
    let registered = binding.schema.response.as_ref().unwrap();
    assert!(registered["201"]["properties"]["id"].get("format").is_none());

    // The compiled config keeps the document's formats untouched.
    let route = config
        .routes
        .iter()
        .find(|route| route.operation_id == "createPet")
        .unwrap();
    let compiled = route.schema.response.as_ref().unwrap();
    assert_eq!(compiled["201"]["properties"]["id"]["format"], "int64");
}

#[test]
fn bindings_expose_the_operation_source_verbatim() {
    let mut doc = common::petstore_doc();
    doc["paths"]["/pet"]["get"]["x-audit"] = json!(true);

    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::inline(doc).with_resolver(petstore_resolver());
    mount(&mut registrar, &options).unwrap();

    let binding = &registrar.bindings[0];
    assert_eq!(binding.config.oapi["operationId"], "listPets");
    assert_eq!(binding.config.oapi["x-audit"], true);
}

#[test]
fn document_prefix_applies_to_every_url() {
    let mut doc = common::petstore_doc();
    doc["x-prefix"] = json!("/v1");

    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::inline(doc).with_resolver(petstore_resolver());
    mount(&mut registrar, &options).unwrap();

    let urls: Vec<&str> = registrar
        .bindings
        .iter()
        .map(|binding| binding.url.as_str())
        .collect();
    assert_eq!(
        urls,
        vec![
            "/v1/pet",
            "/v1/pet",
            "/v1/pet/:petId",
            "/v1/pet/:petId",
            "/v1/user/:name",
        ]
    );
}

#[test]
fn caller_prefix_overrides_the_document_prefix() {
    let mut doc = common::petstore_doc();
    doc["x-prefix"] = json!("/v1");

    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::inline(doc)
        .with_resolver(petstore_resolver())
        .with_prefix("api");
    mount(&mut registrar, &options).unwrap();

    assert_eq!(registrar.bindings[0].url, "/api/pet");
}

#[test]
fn wildcard_routes_mount_with_the_rewritten_url() {
    let mut registrar = RecordingRegistrar::default();
    let resolver = ResolverOptions::new().with_controller(
        oapiglue::resolver::Controller::new().with_operation("getFile", |req| {
            oapiglue::HandlerResponse::json(200, json!({ "path": req.get_path_param("path") }))
        }),
    );
    let options = MountOptions::inline(common::wildcard_doc()).with_resolver(resolver);
    mount(&mut registrar, &options).unwrap();

    let binding = &registrar.bindings[0];
    assert_eq!(binding.url, "/files/*");

    // The HTTP layer captures positionally; the handler still sees the
    // declared parameter name.
    let mut request = HandlerRequest::new(binding.method.clone(), "/files/a/b.txt");
    request.set_path_param("*", "a/b.txt".to_string());
    let response = binding.handler.call(request);
    assert_eq!(response.body["path"], "a/b.txt");
}

#[test]
fn mount_from_a_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api.yaml");
    std::fs::write(
        &path,
        r#"openapi: 3.0.0
info:
  title: File API
  version: "1.0.0"
paths:
  /ping:
    get:
      operationId: ping
      responses:
        "200":
          description: ok
"#,
    )
    .unwrap();

    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::file(&path)
        .with_resolver(ResolverOptions::new().with_controller(common::controller(&["ping"])));
    mount(&mut registrar, &options).unwrap();

    assert_eq!(registrar.events, vec!["GET /ping"]);
}

#[test]
fn registration_without_bound_handlers_is_an_error() {
    let document = OpenApiDocument::from_value(common::petstore_doc()).unwrap();
    let config = compile(&document).unwrap();

    let mut registrar = RecordingRegistrar::default();
    let err = register_routes(&mut registrar, &config, None).unwrap_err();
    assert!(err.to_string().contains("no bound handler"));
}

#[test]
fn bind_handlers_rejects_a_broken_mode_chain_up_front() {
    let document = OpenApiDocument::from_value(common::petstore_doc()).unwrap();
    let mut config = compile(&document).unwrap();

    let options = ResolverOptions::new()
        .with_resolution([oapiglue::ResolutionMode::Unique]);
    assert!(bind_handlers(&mut config, &options).is_err());
    // Nothing was partially bound.
    assert!(config.routes.iter().all(|route| route.handler.is_none()));
}

#[test]
fn empty_mode_chain_mounts_every_route_as_not_implemented() {
    let mut registrar = RecordingRegistrar::default();
    let options = MountOptions::inline(common::petstore_doc())
        .with_resolver(ResolverOptions::new().with_resolution([]));
    mount(&mut registrar, &options).unwrap();

    let binding = &registrar.bindings[0];
    let response = binding
        .handler
        .call(HandlerRequest::new(binding.method.clone(), "/pet"));
    assert_eq!(response.status, 501);
    assert_eq!(response.body["error"], "Operation listPets not implemented");
}

//! # oapiglue
//!
//! **oapiglue** turns an [OpenAPI 3.x](https://spec.openapis.org/oas/v3.1.0)
//! document into runtime request-routing configuration and resolves each
//! operation to a concrete handler.
//!
//! ## Overview
//!
//! The crate is the glue between a bundled OpenAPI document and an HTTP
//! server: it compiles the document once at startup into an ordered list of
//! route descriptors with validation schemas, binds a handler to every route
//! through configurable resolution strategies, and hands the result to the
//! caller's HTTP layer for registration. The server itself, JSON-Schema
//! validation execution, and reference bundling are external collaborators.
//!
//! ## Architecture
//!
//! - **[`spec`]** - the spec compiler: document → [`spec::ParsedConfig`]
//!   (generic metadata, shared schema container, ordered routes)
//! - **[`resolver`]** - the handler resolution engine: route + options →
//!   [`handler::Handler`], via `unique` / `per-route` / `per-operation` /
//!   `manual` modes with a 501 fallback
//! - **[`mount`]** - the registration seam: binds handlers and registers
//!   every route with a caller-supplied [`mount::RouteRegistrar`]
//! - **[`handler`]** - the handler callable and its request/response types
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use oapiglue::resolver::{Controller, ResolverOptions};
//! use oapiglue::{HandlerResponse, MountOptions};
//!
//! # struct MyHttpLayer;
//! # impl oapiglue::RouteRegistrar for MyHttpLayer {
//! #     fn add_shared_schema(&mut self, _: &oapiglue::spec::SharedSchema) -> anyhow::Result<()> { Ok(()) }
//! #     fn register_route(&mut self, _: oapiglue::RouteBinding) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # fn main() -> anyhow::Result<()> {
//! let controller = Controller::new().with_operation("getPetById", |req| {
//!     HandlerResponse::json(200, serde_json::json!({ "id": req.get_path_param("id") }))
//! });
//!
//! let mut http = MyHttpLayer;
//! let options = MountOptions::file("openapi.yaml")
//!     .with_resolver(ResolverOptions::new().with_controller(controller));
//! let config = oapiglue::mount(&mut http, &options)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Vendor extensions
//!
//! - `x-wildcard` on a path parameter rewrites its URL segment to a trailing
//!   `*` while keeping the original name visible to handlers;
//! - `x-partial` on a schema strips its `required` list;
//! - `x-controller` on an operation names the controller module for the
//!   `per-operation` resolution mode;
//! - `x-prefix` on the document supplies a default URL prefix.

pub mod handler;
pub mod mount;
pub mod resolver;
pub mod spec;

pub use handler::{Handler, HandlerRequest, HandlerResponse};
pub use mount::{
    bind_handlers, mount, register_routes, MountOptions, RouteBinding, RouteRegistrar,
    Specification,
};
pub use resolver::{resolve, ResolutionError, ResolutionMode, ResolverOptions};
pub use spec::{compile, compile_file, ParsedConfig, ParsedRoute, SpecError};

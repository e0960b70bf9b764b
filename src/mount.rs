//! Route registration seam.
//!
//! The crate does not own an HTTP server; it hands routes to one through the
//! [`RouteRegistrar`] capability. [`mount`] is the one-call orchestration a
//! caller runs at startup: load → compile → bind handlers → register, in
//! compiled order. Registration order is preserved because it decides routing
//! precedence for overlapping patterns.

use std::path::PathBuf;

use anyhow::Context;
use http::Method;
use serde_json::Value;
use tracing::{debug, info};

use crate::handler::Handler;
use crate::resolver::{resolve, ResolutionError, ResolverOptions};
use crate::spec::{
    compile, load_document, OpenApiDocument, ParsedConfig, RouteSchema, SharedSchema,
};

/// Route registration capability of the external HTTP layer.
pub trait RouteRegistrar {
    /// Called once, before any route, when the document declares shared
    /// definitions. The container must be known to the downstream validation
    /// engine before route schemas referencing it are compiled.
    fn add_shared_schema(&mut self, shared: &SharedSchema) -> anyhow::Result<()>;

    /// Register one route.
    fn register_route(&mut self, binding: RouteBinding) -> anyhow::Result<()>;
}

/// One registered route, as handed to the HTTP layer.
#[derive(Debug, Clone)]
pub struct RouteBinding {
    pub method: Method,
    /// Effective URL, prefix applied
    pub url: String,
    /// Validation schema, response formats already stripped
    pub schema: RouteSchema,
    pub operation_id: String,
    pub handler: Handler,
    pub config: RouteConfig,
}

/// Per-route config blob exposed for downstream inspection.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Verbatim OpenAPI operation object
    pub oapi: Value,
}

/// Where the OpenAPI document comes from.
#[derive(Debug, Clone)]
pub enum Specification {
    /// An already bundled in-memory document
    Inline(Value),
    /// A file path loaded through [`load_document`]
    File(PathBuf),
}

/// Configuration surface for [`mount`].
#[derive(Debug)]
pub struct MountOptions {
    pub specification: Specification,
    /// Caller-supplied prefix; wins over the document's `x-prefix`
    pub prefix: Option<String>,
    pub resolver: ResolverOptions,
}

impl MountOptions {
    #[must_use]
    pub fn new(specification: Specification) -> Self {
        Self {
            specification,
            prefix: None,
            resolver: ResolverOptions::new(),
        }
    }

    /// Mount an inline document.
    #[must_use]
    pub fn inline(document: Value) -> Self {
        Self::new(Specification::Inline(document))
    }

    /// Mount a document loaded from disk.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Specification::File(path.into()))
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverOptions) -> Self {
        self.resolver = resolver;
        self
    }
}

/// Attach exactly one handler to every route.
///
/// Options are validated for the whole mode chain first, so a
/// misconfiguration fails before any route resolves. The route list is never
/// restructured; only the `handler` slot is filled.
pub fn bind_handlers(
    config: &mut ParsedConfig,
    options: &ResolverOptions,
) -> Result<(), ResolutionError> {
    options.validate()?;
    for route in &mut config.routes {
        let handler = resolve(route, options)?;
        route.handler = Some(handler);
    }
    Ok(())
}

/// Register the shared schema and every route, in compiled order.
///
/// The effective prefix is `prefix_override` when given, else the document
/// prefix. A route without a bound handler is an error; run
/// [`bind_handlers`] first.
pub fn register_routes<R: RouteRegistrar>(
    registrar: &mut R,
    config: &ParsedConfig,
    prefix_override: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(shared) = &config.shared {
        registrar
            .add_shared_schema(shared)
            .context("failed to register the shared schema container")?;
    }

    let prefix = prefix_override.or(config.prefix.as_deref());

    for route in &config.routes {
        let handler = route.handler.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "route {} {} has no bound handler; call bind_handlers before registration",
                route.method,
                route.url
            )
        })?;

        let mut schema = route.schema.clone();
        if let Some(response) = &mut schema.response {
            for value in response.values_mut() {
                strip_response_formats(value);
            }
        }

        let url = apply_prefix(prefix, &route.url);
        debug!(method = %route.method, %url, operation_id = %route.operation_id, "registering route");
        registrar
            .register_route(RouteBinding {
                method: route.method.clone(),
                url,
                schema,
                operation_id: route.operation_id.clone(),
                handler,
                config: RouteConfig {
                    oapi: route.openapi_source.clone(),
                },
            })
            .with_context(|| {
                format!("failed to register route {} {}", route.method, route.url)
            })?;
    }
    Ok(())
}

/// Load, compile, bind, and register in one call; returns the bound config.
pub fn mount<R: RouteRegistrar>(
    registrar: &mut R,
    options: &MountOptions,
) -> anyhow::Result<ParsedConfig> {
    let document = match &options.specification {
        Specification::Inline(value) => OpenApiDocument::from_value(value.clone())?,
        Specification::File(path) => load_document(path)?,
    };

    let mut config = compile(&document)?;
    bind_handlers(&mut config, &options.resolver)?;
    register_routes(registrar, &config, options.prefix.as_deref())?;

    info!(routes = config.routes.len(), "mounted OpenAPI routes");
    Ok(config)
}

/// Remove `format: int32` / `format: int64` members anywhere inside a
/// response schema, so downstream validators lacking those formats accept it.
fn strip_response_formats(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            let unknown = map
                .get("format")
                .and_then(Value::as_str)
                .is_some_and(|format| matches!(format, "int32" | "int64"));
            if unknown {
                map.remove("format");
            }
            for value in map.values_mut() {
                strip_response_formats(value);
            }
        }
        Value::Array(items) => {
            for value in items {
                strip_response_formats(value);
            }
        }
        _ => {}
    }
}

/// Prepend a prefix with slash normalization; `None` and empty prefixes are
/// no-ops.
fn apply_prefix(prefix: Option<&str>, url: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            let trimmed = prefix.trim_end_matches('/');
            if trimmed.is_empty() {
                return url.to_string();
            }
            if trimmed.starts_with('/') {
                format!("{trimmed}{url}")
            } else {
                format!("/{trimmed}{url}")
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(apply_prefix(Some("/api"), "/pet"), "/api/pet");
        assert_eq!(apply_prefix(Some("api/"), "/pet"), "/api/pet");
        assert_eq!(apply_prefix(Some("/"), "/pet"), "/pet");
        assert_eq!(apply_prefix(None, "/pet"), "/pet");
    }

    #[test]
    fn test_int_formats_stripped_recursively() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer", "format": "int64" },
                "when": { "type": "string", "format": "date-time" },
                "nested": { "items": { "format": "int32" } }
            }
        });
        strip_response_formats(&mut schema);
        assert!(schema["properties"]["id"].get("format").is_none());
        assert_eq!(schema["properties"]["when"]["format"], "date-time");
        assert!(schema["properties"]["nested"]["items"].get("format").is_none());
    }
}

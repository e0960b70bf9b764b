use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::handler::Handler;

/// Fixed identifier of the shared schema container.
///
/// Route schemas reference shared definitions through this URI instead of
/// duplicating them; the container must be registered with the downstream
/// validation engine under this id before any route schema is compiled.
pub const SHARED_SCHEMA_ID: &str = "urn:schema:api";

/// Output of [`compile`](super::compile).
///
/// `routes` is fully materialized before any handler resolution begins;
/// resolution only ever fills the per-route `handler` slot, it never
/// restructures the list.
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    /// All top-level document fields except `paths`, copied verbatim in
    /// document order.
    pub generic: Map<String, Value>,
    /// Shared schema container, when the document declares component schemas.
    pub shared: Option<SharedSchema>,
    /// Routes in document path order, then verb order within a path.
    pub routes: Vec<ParsedRoute>,
    /// URL prefix from the document's `x-prefix` extension; a caller-supplied
    /// prefix wins over it at registration time.
    pub prefix: Option<String>,
}

/// Named schema definitions gathered from `definitions` and
/// `components.schemas`, exposed under [`SHARED_SCHEMA_ID`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedSchema {
    /// Always [`SHARED_SCHEMA_ID`]
    #[serde(rename = "$id")]
    pub id: String,
    /// Normalized definitions by name
    pub definitions: Map<String, Value>,
}

impl SharedSchema {
    pub(super) fn new(definitions: Map<String, Value>) -> Self {
        Self {
            id: SHARED_SCHEMA_ID.to_string(),
            definitions,
        }
    }
}

/// One (path, HTTP verb) operation compiled into a registrable route.
#[derive(Debug, Clone)]
pub struct ParsedRoute {
    /// Uppercased HTTP verb
    pub method: Method,
    /// Path template in positional form (`/a/:id`), or with a trailing `*`
    /// when a wildcard parameter rewrote the segment
    pub url: String,
    /// Validation schema parts for the route
    pub schema: RouteSchema,
    /// From the document when present, else derived from method + path
    pub operation_id: String,
    /// The original operation object, preserved verbatim for downstream
    /// inspection (vendor extensions and the like)
    pub openapi_source: Value,
    /// Name of the path parameter rewritten to a trailing wildcard, if any
    pub wildcard: Option<String>,
    /// Bound by the handler resolver; exactly one per route after resolution
    pub handler: Option<Handler>,
}

/// Validation schema container for one route.
///
/// Each part is independently optional and omitted when serialized if absent.
/// `response` in particular is `None` (not an empty map) when no status code
/// carries a JSON schema; callers treat presence as a signal to post-process.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    /// The documented `operationId`, copied through for documentation
    /// tooling; absent when the route's id had to be derived
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Object schema over path parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Object schema over query parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub querystring: Option<Value>,
    /// Object schema over header parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    /// Request body schema (`application/json` only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Response schemas keyed by status code; `default` is remapped to `xxx`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Map<String, Value>>,
}

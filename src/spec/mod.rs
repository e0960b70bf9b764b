//! # Spec Compiler
//!
//! Translates a bundled OpenAPI 3.x document into a [`ParsedConfig`]: the
//! document's generic metadata, an optional shared schema container, and an
//! ordered list of [`ParsedRoute`] entries ready for handler resolution and
//! registration.
//!
//! Compilation runs once at startup. The document must already be bundled
//! (external references inlined); internal references resolve through the
//! [`ReferenceTable`] and any miss aborts compilation.

mod build;
mod document;
mod error;
mod load;
mod schema;
mod types;

pub use build::compile;
pub use document::{OpenApiDocument, ReferenceTable};
pub use error::SpecError;
pub use load::{compile_file, load_document};
pub use schema::normalize_schema;
pub use types::{ParsedConfig, ParsedRoute, RouteSchema, SharedSchema, SHARED_SCHEMA_ID};

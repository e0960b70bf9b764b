use serde_json::Value;

use super::error::SpecError;

/// A bundled OpenAPI document.
///
/// Bundling is an external collaborator's job: all external references must
/// already be inlined so that every `$ref` left in the tree is an internal
/// `#/...` JSON pointer resolvable through [`ReferenceTable`]. The document
/// is immutable input; compilation never mutates it.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    root: Value,
}

impl OpenApiDocument {
    /// Wrap an in-memory document. The root must be a JSON object.
    pub fn from_value(root: Value) -> Result<Self, SpecError> {
        if !root.is_object() {
            return Err(SpecError::Validation {
                message: "the document root must be an object".to_string(),
            });
        }
        Ok(Self { root })
    }

    /// The `openapi` version field, when present and a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root.get("openapi").and_then(Value::as_str)
    }

    /// Raw access to the document root.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// URI lookup table over this document.
    #[must_use]
    pub fn reference_table(&self) -> ReferenceTable<'_> {
        ReferenceTable { root: &self.root }
    }
}

/// Reference lookup over a bundled document.
///
/// Resolves internal `#/...` URIs as JSON pointers (with `~0`/`~1`
/// unescaping). Anything else is treated as unresolvable: after bundling no
/// external URI should remain.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTable<'a> {
    root: &'a Value,
}

impl<'a> ReferenceTable<'a> {
    /// Resolve a reference URI to the node it names.
    pub fn get(&self, reference: &str) -> Result<&'a Value, SpecError> {
        reference
            .strip_prefix('#')
            .and_then(|pointer| self.root.pointer(pointer))
            .ok_or_else(|| SpecError::UnresolvedReference {
                reference: reference.to_string(),
            })
    }

    /// Dereference a `{"$ref": ...}` node, or return the node unchanged.
    pub fn resolve<'v>(&self, node: &'v Value) -> Result<&'v Value, SpecError>
    where
        'a: 'v,
    {
        match reference_target(node) {
            Some(reference) => self.get(reference),
            None => Ok(node),
        }
    }
}

/// The string-valued `$ref` member of an object node, when present.
///
/// Only string values count as references; a non-string `$ref` member is
/// treated as an ordinary property.
#[must_use]
pub(super) fn reference_target(node: &Value) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

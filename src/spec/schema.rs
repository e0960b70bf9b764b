//! Recursive schema normalization.
//!
//! Every schema node that ends up in a route schema or the shared container
//! passes through [`normalize_schema`], which applies two rewrites:
//!
//! - `$ref` targets naming component schemas are redirected to the shared
//!   container URI so route schemas reference one registered definition set
//!   instead of duplicating it;
//! - the `x-partial` extension strips a schema's `required` list, producing a
//!   "partial" variant that reuses a success shape for alternate or error
//!   responses without its mandatory fields.

use serde_json::{Map, Value};

use super::document::{reference_target, ReferenceTable};
use super::error::SpecError;
use super::types::SHARED_SCHEMA_ID;

const PARTIAL_EXT: &str = "x-partial";

/// Closed classification of a schema tree node.
enum SchemaNode<'v> {
    /// Object carrying a string-valued `$ref`
    Reference(&'v Map<String, Value>),
    Object(&'v Map<String, Value>),
    Array(&'v [Value]),
    Scalar(&'v Value),
}

fn classify(value: &Value) -> SchemaNode<'_> {
    match value {
        Value::Object(map) if reference_target(value).is_some() => SchemaNode::Reference(map),
        Value::Object(map) => SchemaNode::Object(map),
        Value::Array(items) => SchemaNode::Array(items),
        other => SchemaNode::Scalar(other),
    }
}

/// Normalize one schema node and everything below it.
///
/// Unresolvable references abort with [`SpecError::UnresolvedReference`];
/// compilation treats that as fatal.
pub fn normalize_schema(value: &Value, refs: &ReferenceTable<'_>) -> Result<Value, SpecError> {
    match classify(value) {
        SchemaNode::Scalar(scalar) => Ok(scalar.clone()),
        SchemaNode::Array(items) => {
            let normalized = items
                .iter()
                .map(|item| normalize_schema(item, refs))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(normalized))
        }
        SchemaNode::Reference(map) | SchemaNode::Object(map) => normalize_object(map, refs),
    }
}

fn normalize_object(map: &Map<String, Value>, refs: &ReferenceTable<'_>) -> Result<Value, SpecError> {
    let mut node = map.clone();
    let partial = node.remove(PARTIAL_EXT).is_some_and(|flag| is_truthy(&flag));

    if partial {
        node = apply_partial(node, refs)?;
    }

    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        if let Some(rewritten) = rewrite_shared_reference(reference) {
            let mut out = Map::new();
            out.insert("$ref".to_string(), Value::String(rewritten));
            return Ok(Value::Object(out));
        }
        // References outside the component namespaces pass through untouched.
        return Ok(Value::Object(node));
    }

    let mut out = Map::new();
    for (key, child) in &node {
        out.insert(key.clone(), normalize_schema(child, refs)?);
    }
    Ok(Value::Object(out))
}

/// Strip `required` from a node marked `x-partial`.
///
/// A reference node is dereferenced first: when the target carries a
/// top-level `required` the target is inlined minus that list, otherwise the
/// node stays a reference. A plain object simply loses its own `required`.
fn apply_partial(
    mut node: Map<String, Value>,
    refs: &ReferenceTable<'_>,
) -> Result<Map<String, Value>, SpecError> {
    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        let reference = reference.to_string();
        let target = refs.get(&reference)?;
        if target.get("required").is_some() {
            let mut inlined = target.as_object().cloned().unwrap_or_default();
            inlined.remove("required");
            return Ok(inlined);
        }
        return Ok(node);
    }

    node.remove("required");
    Ok(node)
}

/// Redirect component-schema references to the shared container.
///
/// `#/components/schemas/<name>` and `#/definitions/<name>` both become
/// `urn:schema:api#/definitions/<name>`; any other target is left alone.
fn rewrite_shared_reference(reference: &str) -> Option<String> {
    reference
        .strip_prefix("#/components/schemas/")
        .or_else(|| reference.strip_prefix("#/definitions/"))
        .map(|name| format!("{SHARED_SCHEMA_ID}#/definitions/{name}"))
}

/// JavaScript-style truthiness, the convention vendor extensions follow:
/// null, false, 0, and the empty string are falsy; arrays and objects are
/// truthy regardless of content.
pub(super) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::OpenApiDocument;
    use serde_json::json;

    fn doc(value: Value) -> OpenApiDocument {
        OpenApiDocument::from_value(value).unwrap()
    }

    #[test]
    fn test_component_reference_rewritten() {
        let document = doc(json!({}));
        let normalized = normalize_schema(
            &json!({ "$ref": "#/components/schemas/Pet", "description": "ignored" }),
            &document.reference_table(),
        )
        .unwrap();
        assert_eq!(
            normalized,
            json!({ "$ref": "urn:schema:api#/definitions/Pet" })
        );
    }

    #[test]
    fn test_foreign_reference_untouched() {
        let document = doc(json!({}));
        let node = json!({ "$ref": "#/components/responses/Err" });
        let normalized = normalize_schema(&node, &document.reference_table()).unwrap();
        assert_eq!(normalized, node);
    }

    #[test]
    fn test_partial_strips_required_from_object() {
        let document = doc(json!({}));
        let normalized = normalize_schema(
            &json!({
                "x-partial": true,
                "type": "object",
                "required": ["id"],
                "properties": { "id": { "type": "string" } }
            }),
            &document.reference_table(),
        )
        .unwrap();
        assert!(normalized.get("required").is_none());
        assert!(normalized.get("x-partial").is_none());
        assert_eq!(normalized["type"], "object");
    }

    #[test]
    fn test_partial_inlines_reference_target_without_required() {
        let document = doc(json!({
            "components": { "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                }
            }}
        }));
        let normalized = normalize_schema(
            &json!({ "x-partial": true, "$ref": "#/components/schemas/Pet" }),
            &document.reference_table(),
        )
        .unwrap();
        assert!(normalized.get("required").is_none());
        assert_eq!(normalized["properties"]["name"]["type"], "string");
    }

    #[test]
    fn test_partial_keeps_reference_when_target_has_no_required() {
        let document = doc(json!({
            "components": { "schemas": { "Tag": { "type": "string" } } }
        }));
        let normalized = normalize_schema(
            &json!({ "x-partial": true, "$ref": "#/components/schemas/Tag" }),
            &document.reference_table(),
        )
        .unwrap();
        // Still a reference, now pointing at the shared container.
        assert_eq!(
            normalized,
            json!({ "$ref": "urn:schema:api#/definitions/Tag" })
        );
    }

    #[test]
    fn test_falsy_partial_is_removed_but_not_applied() {
        let document = doc(json!({}));
        let normalized = normalize_schema(
            &json!({ "x-partial": 0, "type": "object", "required": ["id"] }),
            &document.reference_table(),
        )
        .unwrap();
        assert_eq!(normalized["required"], json!(["id"]));
        assert!(normalized.get("x-partial").is_none());
    }

    #[test]
    fn test_truthiness_follows_extension_convention() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!(1)));
    }
}

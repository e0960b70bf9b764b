//! Spec compiler: bundled document in, [`ParsedConfig`] out.
//!
//! Iteration order is load-bearing. Routes come out in document path order,
//! then verb order within a path item, because registration order decides
//! routing precedence for overlapping patterns downstream.

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::document::{OpenApiDocument, ReferenceTable};
use super::error::SpecError;
use super::schema::{is_truthy, normalize_schema};
use super::types::{ParsedConfig, ParsedRoute, RouteSchema, SharedSchema};

const WILDCARD_EXT: &str = "x-wildcard";
const PREFIX_EXT: &str = "x-prefix";

/// Compile a bundled OpenAPI document into routes.
///
/// Fails with [`SpecError::Validation`] when the `openapi` version field is
/// absent or not a 3.x version, before any route is produced. Unresolvable
/// references abort with [`SpecError::UnresolvedReference`].
pub fn compile(document: &OpenApiDocument) -> Result<ParsedConfig, SpecError> {
    let version = document.version().ok_or_else(|| SpecError::Validation {
        message: "the document must carry a string `openapi` version field".to_string(),
    })?;
    if !version.starts_with("3.") {
        return Err(SpecError::Validation {
            message: format!("unsupported OpenAPI version `{version}`: expected 3.x"),
        });
    }

    let root = document
        .root()
        .as_object()
        .ok_or_else(|| SpecError::Validation {
            message: "the document root must be an object".to_string(),
        })?;
    let refs = document.reference_table();

    let mut config = ParsedConfig {
        generic: Map::new(),
        shared: build_shared_schema(root, &refs)?,
        routes: Vec::new(),
        prefix: root
            .get(PREFIX_EXT)
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    for (key, value) in root {
        if key == "paths" {
            process_paths(&mut config, value, &refs)?;
        } else {
            config.generic.insert(key.clone(), value.clone());
        }
    }

    debug!(
        version,
        routes = config.routes.len(),
        shared = config.shared.is_some(),
        "compiled OpenAPI document"
    );
    Ok(config)
}

/// Gather `definitions` and `components.schemas` into the shared container.
/// Component schemas win on a name clash; every definition is normalized.
fn build_shared_schema(
    root: &Map<String, Value>,
    refs: &ReferenceTable<'_>,
) -> Result<Option<SharedSchema>, SpecError> {
    let definitions = root.get("definitions").and_then(Value::as_object);
    let components = root
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object);

    if definitions.is_none() && components.is_none() {
        return Ok(None);
    }

    let mut merged = Map::new();
    for source in [definitions, components].into_iter().flatten() {
        for (name, schema) in source {
            merged.insert(name.clone(), normalize_schema(schema, refs)?);
        }
    }
    Ok(Some(SharedSchema::new(merged)))
}

fn process_paths(
    config: &mut ParsedConfig,
    paths: &Value,
    refs: &ReferenceTable<'_>,
) -> Result<(), SpecError> {
    let Some(paths) = paths.as_object() else {
        return Ok(());
    };

    for (path, item) in paths {
        let Some(path_item) = item.as_object() else {
            continue;
        };

        // Path-level docs and parameters become per-path defaults cloned
        // into every operation below.
        let mut generic = RouteSchema::default();
        copy_docs(path_item, &mut generic);
        if let Some(parameters) = path_item.get("parameters").and_then(Value::as_array) {
            partition_parameters(&mut generic, parameters, refs)?;
        }

        for (verb, operation) in path_item {
            let Some(method) = recognize_verb(verb) else {
                continue;
            };
            let Some(operation) = operation.as_object() else {
                continue;
            };
            let route = build_route(path, verb, method, operation, path_item, &generic, refs)?;
            config.routes.push(route);
        }
    }
    Ok(())
}

/// The recognized HTTP operations on a path item. `trace` is deliberately
/// not among them.
fn recognize_verb(verb: &str) -> Option<Method> {
    match verb {
        "delete" => Some(Method::DELETE),
        "get" => Some(Method::GET),
        "head" => Some(Method::HEAD),
        "patch" => Some(Method::PATCH),
        "post" => Some(Method::POST),
        "put" => Some(Method::PUT),
        "options" => Some(Method::OPTIONS),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_route(
    path: &str,
    verb: &str,
    method: Method,
    operation: &Map<String, Value>,
    path_item: &Map<String, Value>,
    generic: &RouteSchema,
    refs: &ReferenceTable<'_>,
) -> Result<ParsedRoute, SpecError> {
    let (url, wildcard) = make_url(path, path_item, operation, refs)?;
    let schema = build_operation_schema(generic, operation, refs)?;
    let operation_id = operation
        .get("operationId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| make_operation_id(verb, path));

    Ok(ParsedRoute {
        method,
        url,
        schema,
        operation_id,
        openapi_source: Value::Object(operation.clone()),
        wildcard,
        handler: None,
    })
}

fn build_operation_schema(
    generic: &RouteSchema,
    operation: &Map<String, Value>,
    refs: &ReferenceTable<'_>,
) -> Result<RouteSchema, SpecError> {
    let mut schema = generic.clone();
    copy_docs(operation, &mut schema);
    if let Some(tags) = operation.get("tags").filter(|tags| is_truthy(tags)) {
        schema.tags = Some(tags.clone());
    }
    if let Some(id) = operation.get("operationId").and_then(Value::as_str) {
        schema.operation_id = Some(id.to_string());
    }

    if let Some(parameters) = operation.get("parameters").and_then(Value::as_array) {
        partition_parameters(&mut schema, parameters, refs)?;
    }

    if let Some(body) = parse_body(operation.get("requestBody"), refs)? {
        schema.body = Some(body);
    }
    schema.response = parse_responses(operation.get("responses"), refs)?;

    Ok(schema)
}

/// Copy truthy `summary`/`description` onto the schema (empty strings are
/// skipped, matching the extension truthiness convention).
fn copy_docs(source: &Map<String, Value>, schema: &mut RouteSchema) {
    for (key, slot) in [
        ("summary", &mut schema.summary),
        ("description", &mut schema.description),
    ] {
        if let Some(text) = source
            .get(key)
            .filter(|text| is_truthy(text))
            .and_then(Value::as_str)
        {
            *slot = Some(text.to_string());
        }
    }
}

/// Partition parameters by their `in` location and merge each partition into
/// the matching schema part. Cookie parameters are not supported and are
/// dropped here.
fn partition_parameters(
    schema: &mut RouteSchema,
    parameters: &[Value],
    refs: &ReferenceTable<'_>,
) -> Result<(), SpecError> {
    let mut params = Vec::new();
    let mut querystring = Vec::new();
    let mut headers = Vec::new();

    for item in parameters {
        let item = refs.resolve(item)?;
        match item.get("in").and_then(Value::as_str) {
            Some("path") => params.push(item),
            Some("query") => querystring.push(item),
            Some("header") => headers.push(item),
            _ => {}
        }
    }

    if !params.is_empty() {
        schema.params = Some(merge_params(schema.params.take(), &params, refs)?);
    }
    if !querystring.is_empty() {
        schema.querystring = Some(merge_params(schema.querystring.take(), &querystring, refs)?);
    }
    if !headers.is_empty() {
        schema.headers = Some(merge_params(schema.headers.take(), &headers, refs)?);
    }
    Ok(())
}

/// Build an object schema for one parameter partition, merged over `base`
/// (the path-level defaults).
///
/// Operation-level parameters replace path-level ones of the same property
/// name, including their slot in the `required` union: a base name survives
/// in `required` only while no operation parameter redefines it.
fn merge_params(
    base: Option<Value>,
    parameters: &[&Value],
    refs: &ReferenceTable<'_>,
) -> Result<Value, SpecError> {
    let mut properties = base
        .as_ref()
        .and_then(|b| b.get("properties"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let mut base_required: Vec<String> = base
        .as_ref()
        .and_then(|b| b.get("required"))
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let mut required = Vec::new();

    for item in parameters {
        // A wildcard parameter is exposed under the literal `*` property so
        // the schema lines up with the rewritten URL capture.
        let name = if item.get(WILDCARD_EXT).and_then(Value::as_bool) == Some(true) {
            "*".to_string()
        } else {
            item.get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let mut property = match item.get("schema") {
            Some(schema) => normalize_schema(schema, refs)?,
            None => json!({}),
        };
        if let Some(description) = item.get("description").filter(|d| is_truthy(d)) {
            if let Value::Object(object) = &mut property {
                object.insert("description".to_string(), description.clone());
            }
        }

        base_required.retain(|existing| existing != &name);
        if item.get("required").is_some_and(is_truthy) {
            required.push(name.clone());
        }
        properties.insert(name, property);
    }

    base_required.extend(required);
    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": base_required,
    }))
}

/// Extract the `application/json` schema out of a request body or response
/// object, resolving a reference wrapper first. Other content types yield
/// nothing; a JSON content entry without a schema yields the empty schema.
fn parse_body(body: Option<&Value>, refs: &ReferenceTable<'_>) -> Result<Option<Value>, SpecError> {
    let Some(body) = body else {
        return Ok(None);
    };
    let body = refs.resolve(body)?;
    let Some(media) = body
        .get("content")
        .and_then(|content| content.get("application/json"))
    else {
        return Ok(None);
    };
    match media.get("schema") {
        Some(schema) => normalize_schema(schema, refs).map(Some),
        None => Ok(Some(json!({}))),
    }
}

/// Map responses to schemas by status code. `default` lands under `xxx`.
/// Returns `None` when no status produces a JSON schema so callers can treat
/// presence as a post-processing signal.
fn parse_responses(
    responses: Option<&Value>,
    refs: &ReferenceTable<'_>,
) -> Result<Option<Map<String, Value>>, SpecError> {
    let Some(responses) = responses.and_then(Value::as_object) else {
        return Ok(None);
    };

    let mut out = Map::new();
    for (status, response) in responses {
        let Some(schema) = parse_body(Some(response), refs)? else {
            continue;
        };
        let key = if status == "default" { "xxx" } else { status };
        out.insert(key.to_string(), schema);
    }
    Ok((!out.is_empty()).then_some(out))
}

static PATH_PARAM_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\{(\w+)\}").unwrap()
});

/// Derive a deterministic operation id from method + path.
///
/// `GET /user/{name}` becomes `getUserByName`: segments are title-cased,
/// `{param}` placeholders become `By<Param>`, and everything that is not a
/// letter is stripped.
fn make_operation_id(method: &str, path: &str) -> String {
    let joined: String = path.split('/').skip(1).map(first_upper).collect();
    let replaced = PATH_PARAM_RE.replace_all(&joined, |caps: &regex::Captures<'_>| {
        format!("By{}", first_upper(&caps[1]))
    });

    let mut id = String::with_capacity(method.len() + replaced.len());
    id.push_str(method);
    id.extend(replaced.chars().filter(char::is_ascii_alphabetic));
    id
}

fn first_upper(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert a brace-style template to positional form, rewriting wildcard
/// parameters to `*` and reporting the first wildcard's original name.
///
/// Placeholders are converted wherever they appear, not just when they span
/// a whole segment: `/report.{format}` becomes `/report.:format`.
fn make_url(
    path: &str,
    path_item: &Map<String, Value>,
    operation: &Map<String, Value>,
    refs: &ReferenceTable<'_>,
) -> Result<(String, Option<String>), SpecError> {
    let mut wildcard = None;
    let mut url = String::with_capacity(path.len());
    let mut last = 0;

    for caps in PATH_PARAM_RE.captures_iter(path) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        url.push_str(&path[last..whole.start()]);

        let parameter = find_path_parameter(name.as_str(), path_item, operation, refs)?;
        let is_wildcard = parameter
            .and_then(|p| p.get(WILDCARD_EXT))
            .and_then(Value::as_bool)
            == Some(true);
        if is_wildcard {
            wildcard = Some(name.as_str().to_string());
            url.push('*');
        } else {
            url.push(':');
            url.push_str(name.as_str());
        }
        last = whole.end();
    }
    url.push_str(&path[last..]);

    Ok((url, wildcard))
}

/// Locate the declaration of a path parameter, checking path-level
/// parameters before operation-level ones.
fn find_path_parameter<'v>(
    name: &str,
    path_item: &'v Map<String, Value>,
    operation: &'v Map<String, Value>,
    refs: &ReferenceTable<'v>,
) -> Result<Option<&'v Value>, SpecError> {
    let path_level = path_item.get("parameters").and_then(Value::as_array);
    let op_level = operation.get("parameters").and_then(Value::as_array);

    for item in path_level.into_iter().flatten().chain(op_level.into_iter().flatten()) {
        let item = refs.resolve(item)?;
        let matches = item.get("in").and_then(Value::as_str) == Some("path")
            && item.get("name").and_then(Value::as_str) == Some(name);
        if matches {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_derivation() {
        assert_eq!(make_operation_id("get", "/user/{name}"), "getUserByName");
        assert_eq!(make_operation_id("post", "/pet"), "postPet");
        assert_eq!(
            make_operation_id("delete", "/store/order/{orderId}"),
            "deleteStoreOrderByOrderId"
        );
    }

    #[test]
    fn test_operation_id_strips_non_letters() {
        assert_eq!(
            make_operation_id("get", "/api-v2/user_list"),
            "getApivUserlist"
        );
    }

    #[test]
    fn test_trace_is_not_a_recognized_verb() {
        assert!(recognize_verb("trace").is_none());
        assert_eq!(recognize_verb("get"), Some(Method::GET));
    }
}

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tracing::debug;

use super::build::compile;
use super::document::OpenApiDocument;
use super::types::ParsedConfig;

/// Load a bundled OpenAPI document from disk.
///
/// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
pub fn load_document(path: impl AsRef<Path>) -> anyhow::Result<OpenApiDocument> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read specification file {}", path.display()))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value: Value = if matches!(extension, "yaml" | "yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML specification {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON specification {}", path.display()))?
    };

    debug!(path = %path.display(), "loaded OpenAPI document");
    Ok(OpenApiDocument::from_value(value)?)
}

/// Load-then-compile convenience for file-based specifications.
pub fn compile_file(path: impl AsRef<Path>) -> anyhow::Result<ParsedConfig> {
    let document = load_document(path)?;
    Ok(compile(&document)?)
}

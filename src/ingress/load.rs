use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::error::IngressError;
use super::normalize::VersionedIngress;

/// Result of decoding one manifest document
pub type ManifestDocument = Result<VersionedIngress, IngressError>;

/// Split a `kind: List` wrapper into its items; pass other objects through
fn flatten_list(value: Value, out: &mut Vec<Value>) {
    let is_list = value
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|k| k == "List" || k.ends_with("List"));

    if is_list {
        if let Some(Value::Array(items)) = value.get("items") {
            out.extend(items.iter().cloned());
            return;
        }
    }
    out.push(value);
}

/// Parse manifest text (YAML, optionally multi-document, or JSON)
///
/// Every resource in the text produces one entry. Empty documents are
/// skipped. A document that fails to parse yields an error entry without
/// affecting its siblings; a YAML syntax error stops the stream since the
/// parser cannot resynchronise past it. Unquoted scalar annotation values
/// (`enable-cors: true`) are read as their text.
pub fn load_manifests_str(content: &str) -> Vec<ManifestDocument> {
    let mut values = Vec::new();
    let mut results = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        match Value::deserialize(document) {
            Ok(Value::Null) => {}
            Ok(value) => flatten_list(value, &mut values),
            Err(e) => {
                results.push(Err(IngressError::Syntax {
                    document: index,
                    message: e.to_string(),
                }));
                break;
            }
        }
    }

    let mut decoded: Vec<ManifestDocument> =
        values.into_iter().map(VersionedIngress::from_value).collect();
    decoded.append(&mut results);
    decoded
}

/// Read and parse a manifest file
///
/// # Errors
///
/// Returns [`IngressError::Io`] if the file cannot be read. Per-document
/// failures are reported inside the returned vector.
pub fn load_manifest_file(path: impl AsRef<Path>) -> Result<Vec<ManifestDocument>, IngressError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| IngressError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(load_manifests_str(&content))
}

//! Field extraction from partial score objects.

use serde_json::Value;

use super::schema::{CONTENT_FIELD, METADATA_FIELD};

/// Fields present in one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Full content generated so far, if any.
    pub content: Option<String>,
    /// Raw metadata object, possibly partial.
    pub metadata: Option<Value>,
}

/// Pull the content and metadata out of a snapshot. Pure and idempotent.
pub fn extract(object: &Value) -> Extraction {
    let content = object
        .get(CONTENT_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string);
    let metadata = object.get(METADATA_FIELD).filter(|m| m.is_object()).cloned();
    Extraction { content, metadata }
}

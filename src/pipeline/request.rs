//! Canonical ingestion request and upload-event normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const FILE_PATH_KEYS: [&str; 2] = ["filePath", "file_path"];
const DOCUMENT_ID_KEYS: [&str; 4] = ["documentId", "fileId", "document_id", "file_id"];

/// A single document to ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRequest {
    /// Path of the uploaded file.
    pub file_path: String,
    /// Opaque identifier of the logical document.
    pub document_id: String,
}

impl IngestionRequest {
    /// Build a request from explicit values.
    pub fn new(file_path: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            document_id: document_id.into(),
        }
    }

    /// Normalize an upload event into a request.
    ///
    /// Fields may sit at the top level or one level down under `data`; the nested object wins
    /// when both carry a value. Missing fields come back blank and are rejected by validation.
    pub fn from_event(event: &Value) -> Self {
        Self {
            file_path: lookup(event, &FILE_PATH_KEYS).unwrap_or_default(),
            document_id: lookup(event, &DOCUMENT_ID_KEYS).unwrap_or_default(),
        }
    }
}

fn lookup(event: &Value, keys: &[&str]) -> Option<String> {
    let nested = event.get("data").and_then(Value::as_object);
    let top = event.as_object();

    [nested, top]
        .into_iter()
        .flatten()
        .find_map(|scope| field(scope, keys))
}

fn field(scope: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match scope.get(*key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_top_level_fields() {
        let request = IngestionRequest::from_event(&json!({
            "filePath": "/tmp/uploads/a.pdf",
            "fileId": "doc-1"
        }));
        assert_eq!(request, IngestionRequest::new("/tmp/uploads/a.pdf", "doc-1"));
    }

    #[test]
    fn accepts_fields_nested_under_data() {
        let request = IngestionRequest::from_event(&json!({
            "topic": "file.uploaded",
            "data": { "filePath": "/tmp/uploads/b.pdf", "documentId": "doc-2" }
        }));
        assert_eq!(request, IngestionRequest::new("/tmp/uploads/b.pdf", "doc-2"));
    }

    #[test]
    fn nested_values_take_precedence_and_gaps_fall_back_to_top_level() {
        let request = IngestionRequest::from_event(&json!({
            "fileId": "outer",
            "filePath": "/outer.pdf",
            "data": { "fileId": "inner" }
        }));
        assert_eq!(request.document_id, "inner");
        assert_eq!(request.file_path, "/outer.pdf");
    }

    #[test]
    fn accepts_snake_case_and_numeric_ids() {
        let request = IngestionRequest::from_event(&json!({
            "file_path": "/x.pdf",
            "file_id": 1717171717
        }));
        assert_eq!(request, IngestionRequest::new("/x.pdf", "1717171717"));
    }

    #[test]
    fn missing_fields_come_back_blank() {
        let request = IngestionRequest::from_event(&json!({ "data": "not an object" }));
        assert!(request.file_path.is_empty());
        assert!(request.document_id.is_empty());

        let request = IngestionRequest::from_event(&json!(["filePath"]));
        assert!(request.file_path.is_empty());
    }
}

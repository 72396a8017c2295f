// src/models/document.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound on the serialized size of a single document.
pub const MAX_DOCUMENT_BYTES: usize = 50_000;

/// Free-form JSON payload attached to a question (variants, answer key).
///
/// The service never interprets the contents; it stores them and returns
/// them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Value);

impl Document {
    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn serialized_len(&self) -> usize {
        self.0.to_string().len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Document(Value::Object(Default::default()))
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document(value)
    }
}

/// Limits the document size to keep rows bounded.
pub fn validate_document_size(doc: &Document) -> Result<(), validator::ValidationError> {
    if doc.serialized_len() > MAX_DOCUMENT_BYTES {
        return Err(validator::ValidationError::new("document_too_large"));
    }
    Ok(())
}

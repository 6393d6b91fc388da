//! Stored documents and their system fields.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// A stored document: a flat JSON object.
pub type Document = serde_json::Map<String, Value>;

/// System field holding the document id.
pub const ID_FIELD: &str = "_id";
/// System field holding the creation timestamp.
pub const CREATED_FIELD: &str = "_createdDate";
/// System field holding the last-update timestamp.
pub const UPDATED_FIELD: &str = "_updatedDate";

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
#[must_use]
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Assign a fresh id and creation/update timestamps.
///
/// System fields supplied by the caller are overwritten.
#[must_use]
pub fn stamp_new(mut doc: Document) -> Document {
    let now = timestamp();
    doc.insert(
        ID_FIELD.to_owned(),
        Value::String(uuid::Uuid::new_v4().to_string()),
    );
    doc.insert(CREATED_FIELD.to_owned(), Value::String(now.clone()));
    doc.insert(UPDATED_FIELD.to_owned(), Value::String(now));
    doc
}

/// The document's `_id`, if it is a string.
#[must_use]
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Merge `changes` over `stored` and refresh the update timestamp.
pub fn merge_update(stored: &mut Document, changes: Document) {
    for (key, value) in changes {
        stored.insert(key, value);
    }
    stored.insert(UPDATED_FIELD.to_owned(), Value::String(timestamp()));
}

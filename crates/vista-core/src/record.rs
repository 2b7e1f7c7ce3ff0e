//! Record abstraction.
//!
//! Screens are generic over the record shape they display. A record exposes
//! its id, its status and named fields as JSON values; typed records also
//! declare their field names so configuration builders can reject columns
//! that address fields the record does not have.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Placeholder shown for missing values.
pub const EMPTY_DISPLAY: &str = "—";

/// Stable record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record a screen can display.
pub trait Record: Send + Sync + 'static {
    /// Unique identifier of the record.
    fn id(&self) -> &str;

    /// Current status value, if the record has one.
    fn status(&self) -> Option<&str>;

    /// Look up a field by key.
    fn field(&self, key: &str) -> Option<Value>;

    /// Field names this record shape declares.
    ///
    /// `None` means the shape is dynamic and keys are not checked.
    fn field_names() -> Option<&'static [&'static str]>
    where
        Self: Sized,
    {
        None
    }

    /// The record's id as a `RecordId`.
    fn record_id(&self) -> RecordId {
        RecordId(self.id().to_string())
    }
}

/// A record whose status a board can patch locally.
pub trait BoardRecord: Record + Clone {
    /// Overwrite the local status.
    fn set_status(&mut self, status: &str);
}

/// Check a key against the declared fields of `R`.
pub fn has_field<R: Record>(key: &str) -> bool {
    match R::field_names() {
        Some(names) => names.contains(&key),
        None => true,
    }
}

/// Render a JSON value for display.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => EMPTY_DISPLAY.to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.is_empty() => EMPTY_DISPLAY.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => EMPTY_DISPLAY.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

// =============================================================================
// JsonRecord
// =============================================================================

/// A dynamically shaped record backed by a JSON object.
///
/// Reads `id` and `status` from the object's fields of the same name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonRecord(pub Map<String, Value>);

impl JsonRecord {
    /// Wrap a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build from any JSON value; `None` if it is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Borrow a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Convert back into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl Record for JsonRecord {
    fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or("")
    }

    fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }

    fn field(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }
}

impl BoardRecord for JsonRecord {
    fn set_status(&mut self, status: &str) {
        self.0
            .insert("status".to_string(), Value::String(status.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_record_accessors() {
        let record = JsonRecord::from_value(json!({
            "id": "c1",
            "status": "active",
            "title": "Engineer"
        }))
        .unwrap();

        assert_eq!(record.id(), "c1");
        assert_eq!(record.status(), Some("active"));
        assert_eq!(record.field("title"), Some(json!("Engineer")));
        assert_eq!(record.field("missing"), None);
        assert_eq!(record.record_id(), RecordId::from("c1"));
    }

    #[test]
    fn test_json_record_set_status() {
        let mut record = JsonRecord::from_value(json!({ "id": "d1", "status": "discovery" })).unwrap();
        record.set_status("proposal");
        assert_eq!(record.status(), Some("proposal"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(JsonRecord::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), EMPTY_DISPLAY);
        assert_eq!(display_value(&json!("")), EMPTY_DISPLAY);
        assert_eq!(display_value(&json!(true)), "Yes");
        assert_eq!(display_value(&json!(12)), "12");
        assert_eq!(display_value(&json!(["rust", "go"])), "rust, go");
    }

    #[test]
    fn test_dynamic_records_accept_any_key() {
        assert!(has_field::<JsonRecord>("anything"));
    }
}

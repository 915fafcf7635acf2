/// Document database layer
///
/// A narrow client contract over a schemaless document database: documents
/// live in named collections, are addressed by string identifiers and hold a
/// JSON object of fields. Backends: in-memory and sqlite.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::{DatabaseOptions, SqliteDocumentStore};

use crate::error::{CmsError, CmsResult};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Field map of a single document
pub type Fields = serde_json::Map<String, Value>;

/// Marker key of the server timestamp sentinel
pub const SERVER_TIMESTAMP_FIELD: &str = "$serverTimestamp";

/// A stored document with its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Fields with the identifier folded in as an `id` field
    pub fn into_value_with_id(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// How `set` treats an existing document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Full overwrite, existing fields not supplied are dropped
    Replace,
    /// Field-level merge; nested objects are merged, everything else replaced
    Merge,
}

/// Sort direction for ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering clause for `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field path, dot separated for nested fields (e.g. `name.en`)
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Document database client
///
/// Every call is a single round trip; nothing is cached and no call is
/// transactional with any other.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when absent
    async fn get(&self, collection: &str, id: &str) -> CmsResult<Option<Document>>;

    /// Write a document under a caller-chosen identifier
    async fn set(&self, collection: &str, id: &str, fields: Fields, mode: WriteMode) -> CmsResult<()>;

    /// Insert a document under a store-assigned identifier
    async fn add(&self, collection: &str, fields: Fields) -> CmsResult<String>;

    /// Overwrite the given top-level fields of an existing document
    ///
    /// Fails with `NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> CmsResult<()>;

    /// Delete a document; deleting an absent document succeeds
    async fn delete(&self, collection: &str, id: &str) -> CmsResult<()>;

    /// List a collection, optionally ordered by a field
    ///
    /// With an ordering, documents lacking the field are not returned.
    /// Without one, documents come back by identifier.
    async fn list(&self, collection: &str, order_by: Option<&OrderBy>) -> CmsResult<Vec<Document>>;
}

/// Sentinel value replaced by the write time when the document is stored
pub fn server_timestamp() -> Value {
    let mut marker = Fields::new();
    marker.insert(SERVER_TIMESTAMP_FIELD.to_string(), Value::Bool(true));
    Value::Object(marker)
}

/// Whether a value is the server timestamp sentinel
pub fn is_server_timestamp(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.len() == 1 && map.get(SERVER_TIMESTAMP_FIELD) == Some(&Value::Bool(true)),
        _ => false,
    }
}

/// Current time in the format stored for resolved sentinels
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Replace every sentinel in `fields` (at any depth) with `now`
pub fn resolve_sentinels(fields: &mut Fields, now: &str) {
    for value in fields.values_mut() {
        resolve_value(value, now);
    }
}

fn resolve_value(value: &mut Value, now: &str) {
    if is_server_timestamp(value) {
        *value = Value::String(now.to_string());
        return;
    }
    match value {
        Value::Object(map) => {
            for nested in map.values_mut() {
                resolve_value(nested, now);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                resolve_value(item, now);
            }
        }
        _ => {}
    }
}

/// Deep-merge `patch` into `target`
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_fields(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Look up a dot-separated field path
pub fn field_at<'a>(fields: &'a Fields, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = fields.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    match current {
        Value::Null => None,
        other => Some(other),
    }
}

/// Total order over JSON values: type rank first, then value
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Serialize a record into document fields, dropping any `id` field
pub fn encode_record<T: Serialize>(record: &T) -> CmsResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(CmsError::Validation(format!(
            "Record must serialize to an object, got {}",
            other
        ))),
    }
}

/// Deserialize a stored document, folding its identifier into the record
pub fn decode_record<T: DeserializeOwned>(document: Document) -> CmsResult<T> {
    Ok(serde_json::from_value(document.into_value_with_id())?)
}

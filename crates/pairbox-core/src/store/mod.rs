//! Hierarchical document store abstraction.
//!
//! Models a schemaless document tree addressed by `/`-separated paths. Writes
//! append a child under a store-assigned [`RecordKey`]; reads return the
//! direct children of a path. There are no multi-path transactions.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process, for tests and embedding
//! - `RedbStore` (pairbox-cli): on disk
//! - `FaultyStore` (pairbox-harness): fault injection wrapper

mod memory;
mod push_key;

use std::{cmp::Ordering, fmt, sync::Arc};

use ciborium::Value;
use serde::{Serialize, de::DeserializeOwned};

pub use memory::MemoryStore;
pub use push_key::{PUSH_KEY_LEN, PushKeyGenerator};

use crate::error::StoreError;

/// A stored document: an arbitrary CBOR value, usually a map.
pub type Document = Value;

/// Characters that may not appear in a path segment.
const RESERVED: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Check that `segment` can be used as one path component.
pub fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment.contains(RESERVED) {
        return Err("contains a reserved character (/ . # $ [ ])");
    }
    if segment.chars().any(char::is_control) {
        return Err("contains a control character");
    }
    Ok(())
}

/// Store-assigned key of a child document.
///
/// Keys from one generator sort in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(String);

impl RecordKey {
    /// Wrap a key read back from a store.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated path into the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Build a path from segments.
    pub fn from_segments<I, T>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidPath { path: String::new(), reason: "empty path" });
        }
        for segment in &segments {
            validate_segment(segment)
                .map_err(|reason| StoreError::InvalidPath { path: segment.clone(), reason })?;
        }
        Ok(Self { segments })
    }

    /// Parse a `/`-separated path. Leading and trailing slashes are ignored.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let trimmed = text.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidPath { path: text.to_string(), reason: "empty path" });
        }
        Self::from_segments(trimmed.split('/')).map_err(|e| match e {
            StoreError::InvalidPath { reason, .. } => {
                StoreError::InvalidPath { path: text.to_string(), reason }
            },
            other => other,
        })
    }

    /// Path of a child node.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, StoreError> {
        let segment = segment.into();
        validate_segment(&segment)
            .map_err(|reason| StoreError::InvalidPath { path: segment.clone(), reason })?;

        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Path of the child stored under `key`.
    pub fn record(&self, key: &RecordKey) -> Result<Self, StoreError> {
        self.child(key.as_str())
    }

    /// Path components.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Parent path, `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1)
            .then(|| Self { segments: self.segments[..self.segments.len() - 1].to_vec() })
    }

    /// Last path component.
    pub fn last(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Hierarchical document store.
///
/// Calls are synchronous and block until the store answers. Implementations
/// must be safe for concurrent `push` on the same path; each push gets a
/// distinct key.
pub trait DocumentStore: Send + Sync {
    /// Append `document` as a new child of `path` and return its key.
    fn push(&self, path: &StorePath, document: Document) -> Result<RecordKey, StoreError>;

    /// Direct children of `path` in key order. Empty if the path does not
    /// exist.
    fn read(&self, path: &StorePath) -> Result<Vec<(RecordKey, Document)>, StoreError>;

    /// Remove the node at `path` and everything below it.
    fn delete(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Direct children of `path` ordered by the value of `field`, ties broken
    /// by key.
    fn read_ordered_by(
        &self,
        path: &StorePath,
        field: &str,
    ) -> Result<Vec<(RecordKey, Document)>, StoreError> {
        let mut entries = self.read(path)?;
        sort_by_field(&mut entries, field);
        Ok(entries)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn push(&self, path: &StorePath, document: Document) -> Result<RecordKey, StoreError> {
        (**self).push(path, document)
    }

    fn read(&self, path: &StorePath) -> Result<Vec<(RecordKey, Document)>, StoreError> {
        (**self).read(path)
    }

    fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        (**self).delete(path)
    }

    fn read_ordered_by(
        &self,
        path: &StorePath,
        field: &str,
    ) -> Result<Vec<(RecordKey, Document)>, StoreError> {
        (**self).read_ordered_by(path, field)
    }
}

/// Encode a typed value as a document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    Value::serialized(value).map_err(|e| StoreError::Encoding { reason: e.to_string() })
}

/// Decode a document into a typed value.
pub fn from_document<T: DeserializeOwned>(document: &Document) -> Result<T, StoreError> {
    document.deserialized().map_err(|e| StoreError::Encoding { reason: e.to_string() })
}

/// Value of `field` in a map document.
pub fn field<'a>(document: &'a Document, name: &str) -> Option<&'a Value> {
    document
        .as_map()?
        .iter()
        .find(|(key, _)| key.as_text() == Some(name))
        .map(|(_, value)| value)
}

/// Sort entries by `field`, then by key.
pub fn sort_by_field(entries: &mut [(RecordKey, Document)], name: &str) {
    entries.sort_by(|(key_a, doc_a), (key_b, doc_b)| {
        compare_values(field(doc_a, name), field(doc_b, name)).then_with(|| key_a.cmp(key_b))
    });
}

/// Ordering of child values: missing/null, booleans, numbers, text, then
/// anything else.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank_a = value_rank(a);
    let rank_b = value_rank(b);
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (as_number(x), as_number(y)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

fn value_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Integer(_) | Value::Float(_)) => 2,
        Some(Value::Text(_)) => 3,
        Some(_) => 4,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(int) => Some(i128::from(*int) as f64),
        Value::Float(float) => Some(*float),
        _ => None,
    }
}

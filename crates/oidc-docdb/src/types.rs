//! Request and response types shared by all document database backends.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::selector::Selector;

/// Physical location of a view: design document name plus view name.
///
/// Rendered as `_design/{design}/_view/{view}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewRef {
    /// Design document name (without the `_design/` prefix).
    pub design: String,
    /// View name inside the design document.
    pub view: String,
}

impl ViewRef {
    /// Creates a new view reference.
    #[must_use]
    pub fn new(design: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            design: design.into(),
            view: view.into(),
        }
    }
}

impl fmt::Display for ViewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_design/{}/_view/{}", self.design, self.view)
    }
}

/// Options for executing a view.
///
/// Unset options fall back to the database defaults: ascending order,
/// no limit, reduce enabled when the view defines a reduce function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    /// Return only rows with exactly this key.
    pub key: Option<Value>,
    /// Return only rows whose key is one of these (in this order).
    pub keys: Option<Vec<Value>>,
    /// First key of the range (inclusive).
    pub start_key: Option<Value>,
    /// Last key of the range (inclusive).
    pub end_key: Option<Value>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
    /// Number of rows to skip.
    pub skip: Option<usize>,
    /// Walk the index in descending key order.
    pub descending: bool,
    /// Attach the source document to every row.
    pub include_docs: bool,
    /// Run (`Some(true)`), skip (`Some(false)`) or default the reduce step.
    pub reduce: Option<bool>,
}

impl ViewQuery {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the query to one key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Restricts the query to a set of keys.
    #[must_use]
    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the first key of the range.
    #[must_use]
    pub fn with_start_key(mut self, key: impl Into<Value>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    /// Sets the last key of the range.
    #[must_use]
    pub fn with_end_key(mut self, key: impl Into<Value>) -> Self {
        self.end_key = Some(key.into());
        self
    }

    /// Limits the number of returned rows.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips leading rows.
    #[must_use]
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Walks the index in descending order.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Attaches documents to rows.
    #[must_use]
    pub fn include_docs(mut self) -> Self {
        self.include_docs = true;
        self
    }

    /// Explicitly enables or disables the reduce step.
    #[must_use]
    pub fn with_reduce(mut self, reduce: bool) -> Self {
        self.reduce = Some(reduce);
        self
    }
}

/// One row of a view result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Source document ID (absent on reduced rows).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Emitted key.
    #[serde(default)]
    pub key: Value,
    /// Emitted (or reduced) value.
    #[serde(default)]
    pub value: Value,
    /// Source document when `include_docs` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

/// Result of a view execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    /// Total number of rows in the index (absent on reduced results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// Offset of the first returned row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Returned rows.
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

/// Identifier and new revision of a written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRevision {
    /// Document ID.
    pub id: String,
    /// Revision after the write.
    pub rev: String,
}

/// Per-document outcome of a bulk write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    /// Document ID.
    pub id: String,
    /// New revision when the write succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Error code when the write was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error reason when the write was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BulkItemResult {
    /// A successful element.
    #[must_use]
    pub fn written(id: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: Some(rev.into()),
            error: None,
            reason: None,
        }
    }

    /// A rejected element.
    #[must_use]
    pub fn rejected(
        id: impl Into<String>,
        error: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rev: None,
            error: Some(error.into()),
            reason: Some(reason.into()),
        }
    }

    /// Returns `true` if the element was written.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Ad-hoc selector query over the raw document collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FindRequest {
    /// Documents must match this selector.
    pub selector: Selector,
    /// Maximum number of documents.
    pub limit: Option<usize>,
    /// Number of matching documents to skip.
    pub skip: Option<usize>,
}

impl FindRequest {
    /// Creates a request for all documents matching `selector`.
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            limit: None,
            skip: None,
        }
    }

    /// Limits the number of returned documents.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips leading documents.
    #[must_use]
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_view_ref_display() {
        let view = ViewRef::new("openiddict", "token.subject");
        assert_eq!(view.to_string(), "_design/openiddict/_view/token.subject");
    }

    #[test]
    fn test_view_query_builder() {
        let query = ViewQuery::new()
            .with_start_key(json!(["2024-01-01", "2024-02-01"]))
            .with_limit(10)
            .descending()
            .include_docs()
            .with_reduce(false);

        assert_eq!(query.start_key, Some(json!(["2024-01-01", "2024-02-01"])));
        assert_eq!(query.limit, Some(10));
        assert!(query.descending);
        assert!(query.include_docs);
        assert_eq!(query.reduce, Some(false));
        assert!(query.key.is_none());
    }

    #[test]
    fn test_view_row_deserialize_reduced() {
        let row: ViewRow = serde_json::from_value(json!({"key": null, "value": 42})).unwrap();
        assert!(row.id.is_none());
        assert_eq!(row.value, json!(42));
        assert!(row.doc.is_none());
    }

    #[test]
    fn test_bulk_item_result() {
        let ok: BulkItemResult =
            serde_json::from_value(json!({"ok": true, "id": "a", "rev": "2-x"})).unwrap();
        assert!(ok.is_ok());

        let failed: BulkItemResult = serde_json::from_value(
            json!({"id": "b", "error": "conflict", "reason": "Document update conflict."}),
        )
        .unwrap();
        assert!(!failed.is_ok());
        assert_eq!(failed.error.as_deref(), Some("conflict"));
    }
}

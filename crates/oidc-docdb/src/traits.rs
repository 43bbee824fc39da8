//! The backend trait of the document database abstraction layer.

use async_trait::async_trait;
use serde_json::Value;

use crate::design::DesignDocument;
use crate::error::DatabaseError;
use crate::types::{BulkItemResult, DocumentRevision, FindRequest, ViewQuery, ViewRef, ViewResult};

/// A JSON document database with revisions, map/reduce views and bulk writes.
///
/// Documents are JSON objects carrying `_id` and `_rev`. Every successful
/// write produces a new revision; a write naming a stale revision is
/// rejected with [`DatabaseError::Conflict`]. Implementations must be
/// thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use oidc_docdb::{DocumentDatabase, ViewQuery, ViewRef};
///
/// async fn count_tokens(db: &dyn DocumentDatabase) -> oidc_docdb::DatabaseResult<u64> {
///     let result = db
///         .query_view(&ViewRef::new("openiddict", "token"), &ViewQuery::new())
///         .await?;
///     Ok(result.rows.first().and_then(|row| row.value.as_u64()).unwrap_or(0))
/// }
/// ```
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    // ==================== Documents ====================

    /// Reads the current revision of a document.
    ///
    /// Returns `None` if the document does not exist or was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing documents.
    async fn get(&self, id: &str) -> Result<Option<Value>, DatabaseError>;

    /// Creates a new document.
    ///
    /// Uses the document's `_id` when present, otherwise the database assigns one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if a live document with the same ID exists.
    async fn create(&self, document: &Value) -> Result<DocumentRevision, DatabaseError>;

    /// Writes a new revision of an existing document.
    ///
    /// The document must carry the `_rev` it was read at.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if `_rev` is missing or stale.
    /// Returns `DatabaseError::NotFound` if the document does not exist.
    async fn put(&self, id: &str, document: &Value) -> Result<DocumentRevision, DatabaseError>;

    /// Deletes a document at the given revision.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if `rev` is stale, including when the
    /// document is already deleted (its tombstone holds the current revision).
    /// Returns `DatabaseError::NotFound` if the document never existed.
    async fn delete(&self, id: &str, rev: &str) -> Result<DocumentRevision, DatabaseError>;

    /// Writes a batch of documents (including `_deleted` tombstones).
    ///
    /// Elements succeed or fail independently; the outcome of each is
    /// reported in submission order.
    ///
    /// # Errors
    ///
    /// Returns an error only when the batch as a whole could not be submitted.
    async fn bulk_docs(&self, documents: &[Value]) -> Result<Vec<BulkItemResult>, DatabaseError>;

    // ==================== Views ====================

    /// Executes a view.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the design document or view does not exist.
    async fn query_view(
        &self,
        view: &ViewRef,
        query: &ViewQuery,
    ) -> Result<ViewResult, DatabaseError>;

    /// Installs or replaces a design document.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues.
    async fn ensure_design_document(&self, design: &DesignDocument) -> Result<(), DatabaseError>;

    // ==================== Ad-hoc queries ====================

    /// Returns live documents matching a selector.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoUsableIndex` if the backend cannot serve the selector.
    async fn find(&self, request: &FindRequest) -> Result<Vec<Value>, DatabaseError>;

    // ==================== Metadata ====================

    /// Returns a short name for this backend (e.g. "memory", "couchdb").
    fn backend_name(&self) -> &'static str;
}

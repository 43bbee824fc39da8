//! Batched tombstone writes.

use oidc_docdb::{BulkItemFailure, DatabaseError, DynDatabase, ViewRow};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::StoreResult;

/// Minimal identity of a document scheduled for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tombstone {
    pub id: String,
    pub rev: String,
}

impl Tombstone {
    pub fn new(id: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: rev.into(),
        }
    }

    /// Builds a tombstone from a view row emitting `key -> rev`.
    ///
    /// Rows without an ID or a string value are skipped.
    pub fn from_row(row: &ViewRow) -> Option<Self> {
        let id = row.id.as_deref()?;
        let rev = row.value.as_str()?;
        Some(Self::new(id, rev))
    }

    fn to_document(&self) -> Value {
        json!({ "_id": self.id, "_rev": self.rev, "_deleted": true })
    }
}

/// Submits tombstones in bounded batches.
#[derive(Clone)]
pub struct BulkMutator {
    db: DynDatabase,
    batch_size: usize,
}

impl BulkMutator {
    pub fn new(db: DynDatabase, batch_size: usize) -> Self {
        Self {
            db,
            batch_size: batch_size.max(1),
        }
    }

    /// Writes every tombstone, one bulk call per batch, and returns how many
    /// were written.
    ///
    /// Batches run one after another. A batch with any rejected element
    /// fails as a whole; earlier batches stay committed.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::BulkRejected`] when the database rejects an
    /// element, or the transport error of the failed call.
    pub async fn submit_tombstones(&self, tombstones: &[Tombstone]) -> StoreResult<usize> {
        let mut written = 0;

        for batch in tombstones.chunks(self.batch_size) {
            let documents: Vec<Value> = batch.iter().map(Tombstone::to_document).collect();
            let results = self.db.bulk_docs(&documents).await?;

            let failures: Vec<BulkItemFailure> = results
                .iter()
                .filter(|result| !result.is_ok())
                .map(|result| BulkItemFailure {
                    id: result.id.clone(),
                    error: result.error.clone().unwrap_or_default(),
                    reason: result.reason.clone().unwrap_or_default(),
                })
                .collect();

            if !failures.is_empty() {
                warn!(
                    rejected = failures.len(),
                    total = batch.len(),
                    first_id = %failures[0].id,
                    "Bulk tombstone batch rejected"
                );
                return Err(DatabaseError::BulkRejected {
                    failures,
                    total: batch.len(),
                }
                .into());
            }

            written += batch.len();
            debug!(batch = batch.len(), written, "Bulk tombstone batch committed");
        }

        Ok(written)
    }
}

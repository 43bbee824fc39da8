use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use oidc_docdb::{BulkItemResult, DatabaseError, DesignDocument};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// A document revision as kept by the in-memory backend.
#[derive(Debug, Clone)]
pub(crate) struct StoredDocument {
    /// Revision generation (the `N` of `N-hash`).
    pub(crate) generation: u64,
    /// Full revision string.
    pub(crate) rev: String,
    /// Document body including `_id` and `_rev`.
    pub(crate) body: Value,
    /// Whether this revision is a tombstone.
    pub(crate) deleted: bool,
}

/// Request counters, exposed for tests that assert on round trips.
#[derive(Debug, Default)]
pub struct RequestCounters {
    pub(crate) bulk: AtomicU64,
    pub(crate) view: AtomicU64,
    pub(crate) find: AtomicU64,
}

impl RequestCounters {
    /// Number of `bulk_docs` calls.
    pub fn bulk(&self) -> u64 {
        self.bulk.load(Ordering::SeqCst)
    }

    /// Number of `query_view` calls.
    pub fn view(&self) -> u64 {
        self.view.load(Ordering::SeqCst)
    }

    /// Number of `find` calls.
    pub fn find(&self) -> u64 {
        self.find.load(Ordering::SeqCst)
    }
}

/// In-memory document database with CouchDB revision semantics.
///
/// This backend provides:
/// - Revisioned documents (`N-hash`) with stale-revision conflicts
/// - Tombstones that keep the revision chain of deleted documents
/// - Natively evaluated map views with `_count` reduce
/// - Selector queries over live documents
#[derive(Debug)]
pub struct MemoryDatabase {
    /// Documents ordered by ID
    pub(crate) documents: Arc<RwLock<BTreeMap<String, StoredDocument>>>,
    /// Installed design documents by name
    pub(crate) designs: Arc<RwLock<HashMap<String, DesignDocument>>>,
    /// Atomic counter feeding revision hashes and generated IDs
    pub(crate) sequence: AtomicU64,
    /// Request counters
    pub(crate) counters: RequestCounters,
}

impl MemoryDatabase {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            designs: Arc::new(RwLock::new(HashMap::new())),
            sequence: AtomicU64::new(1),
            counters: RequestCounters::default(),
        }
    }

    /// Request counters.
    pub fn counters(&self) -> &RequestCounters {
        &self.counters
    }

    /// Number of live (non-deleted) documents.
    pub async fn live_document_count(&self) -> usize {
        self.documents
            .read()
            .await
            .values()
            .filter(|doc| !doc.deleted)
            .count()
    }

    /// Returns `true` if a tombstone exists for `id`.
    pub async fn is_deleted(&self, id: &str) -> bool {
        self.documents
            .read()
            .await
            .get(id)
            .is_some_and(|doc| doc.deleted)
    }

    /// Generates a fresh document ID.
    pub(crate) fn next_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn next_rev(&self, generation: u64) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let hash = uuid::Uuid::new_v4().simple().to_string();
        format!("{generation}-{}{seq:x}", &hash[..16])
    }

    /// Applies one write against the document map.
    ///
    /// Handles creation, update and deletion (`_deleted: true`) with the
    /// revision rules of the trait: a live document requires its current
    /// `_rev`; a missing document cannot be updated or deleted; a tombstone
    /// can only be recreated without `_rev`, and deleting it again conflicts.
    pub(crate) fn apply_write(
        &self,
        documents: &mut BTreeMap<String, StoredDocument>,
        id: &str,
        incoming: &Value,
    ) -> Result<String, DatabaseError> {
        let body = incoming
            .as_object()
            .ok_or_else(|| DatabaseError::bad_request("bad_request", "Document must be a JSON object"))?;
        let supplied_rev = body.get("_rev").and_then(Value::as_str);
        let deleting = body.get("_deleted").and_then(Value::as_bool).unwrap_or(false);

        let generation = match documents.get(id) {
            Some(existing) if !existing.deleted => match supplied_rev {
                Some(rev) if rev == existing.rev => existing.generation + 1,
                _ => return Err(DatabaseError::conflict(id, "Document update conflict.")),
            },
            Some(tombstone) => {
                if deleting || supplied_rev.is_some() {
                    return Err(DatabaseError::conflict(id, "Document update conflict."));
                }
                tombstone.generation + 1
            }
            None => {
                if deleting || supplied_rev.is_some() {
                    return Err(DatabaseError::not_found(id));
                }
                1
            }
        };

        let rev = self.next_rev(generation);
        let stored_body = if deleting {
            let mut tombstone = Map::new();
            tombstone.insert("_id".into(), Value::String(id.to_string()));
            tombstone.insert("_rev".into(), Value::String(rev.clone()));
            tombstone.insert("_deleted".into(), Value::Bool(true));
            Value::Object(tombstone)
        } else {
            let mut next = body.clone();
            next.insert("_id".into(), Value::String(id.to_string()));
            next.insert("_rev".into(), Value::String(rev.clone()));
            Value::Object(next)
        };

        documents.insert(
            id.to_string(),
            StoredDocument {
                generation,
                rev: rev.clone(),
                body: stored_body,
                deleted: deleting,
            },
        );

        Ok(rev)
    }

    /// Applies a batch of writes under one lock, reporting each outcome.
    pub(crate) async fn apply_bulk(&self, batch: &[Value]) -> Vec<BulkItemResult> {
        let mut documents = self.documents.write().await;
        batch
            .iter()
            .map(|doc| {
                let id = doc
                    .get("_id")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| self.next_id());
                match self.apply_write(&mut documents, &id, doc) {
                    Ok(rev) => BulkItemResult::written(id, rev),
                    Err(DatabaseError::Conflict { reason, .. }) => {
                        BulkItemResult::rejected(id, "conflict", reason)
                    }
                    Err(DatabaseError::NotFound { .. }) => {
                        BulkItemResult::rejected(id, "not_found", "missing")
                    }
                    Err(other) => BulkItemResult::rejected(id, "bad_request", other.to_string()),
                }
            })
            .collect()
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

//! Translation of database write failures into store errors.

use oidc_docdb::{DatabaseError, DocumentRevision};

use crate::error::{StoreError, StoreResult};
use crate::kind::EntityKind;

/// Outcome of a delete the store can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    Deleted(DocumentRevision),
    AlreadyGone,
}

/// Update path: the document must still exist at the known revision.
pub(crate) fn on_update(
    kind: EntityKind,
    id: &str,
    result: Result<DocumentRevision, DatabaseError>,
) -> StoreResult<DocumentRevision> {
    result.map_err(|err| match err {
        DatabaseError::Conflict { .. } | DatabaseError::NotFound { .. } => {
            StoreError::concurrency(kind, id, err)
        }
        other => StoreError::Database(other),
    })
}

/// Delete path: a stale revision is a conflict, a missing document is done.
///
/// A conflict may also mean the document is already deleted; the caller
/// settles that with a read.
pub(crate) fn on_delete(
    kind: EntityKind,
    id: &str,
    result: Result<DocumentRevision, DatabaseError>,
) -> StoreResult<DeleteOutcome> {
    match result {
        Ok(revision) => Ok(DeleteOutcome::Deleted(revision)),
        Err(DatabaseError::NotFound { .. }) => Ok(DeleteOutcome::AlreadyGone),
        Err(err @ DatabaseError::Conflict { .. }) => Err(StoreError::concurrency(kind, id, err)),
        Err(other) => Err(StoreError::Database(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_conflict_and_missing() {
        let conflict = on_update(
            EntityKind::Token,
            "t1",
            Err(DatabaseError::conflict("t1", "Document update conflict.")),
        )
        .unwrap_err();
        assert!(conflict.is_concurrency());

        let missing = on_update(EntityKind::Token, "t1", Err(DatabaseError::not_found("t1")))
            .unwrap_err();
        assert!(missing.is_concurrency());
    }

    #[test]
    fn test_transport_errors_pass_through() {
        let err = on_update(
            EntityKind::Scope,
            "s1",
            Err(DatabaseError::connection("reset by peer")),
        )
        .unwrap_err();
        assert!(err.is_database_error());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_delete_of_missing_document_is_done() {
        let outcome =
            on_delete(EntityKind::Application, "a1", Err(DatabaseError::not_found("a1"))).unwrap();
        assert_eq!(outcome, DeleteOutcome::AlreadyGone);

        let err = on_delete(
            EntityKind::Application,
            "a1",
            Err(DatabaseError::conflict("a1", "Document update conflict.")),
        )
        .unwrap_err();
        assert!(err.is_concurrency());
    }
}

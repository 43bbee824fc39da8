//! Implementation of the DocumentDatabase trait for MemoryDatabase.

use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde_json::{Value, json};

use oidc_docdb::{
    BulkItemResult, DatabaseError, DesignDocument, DocumentDatabase, DocumentRevision,
    FindRequest, ViewQuery, ViewRef, ViewResult,
};

use crate::storage::MemoryDatabase;
use crate::views;

/// Extracts `_id` from a document.
fn extract_id(document: &Value) -> Option<String> {
    document.get("_id").and_then(Value::as_str).map(String::from)
}

#[async_trait]
impl DocumentDatabase for MemoryDatabase {
    async fn get(&self, id: &str) -> Result<Option<Value>, DatabaseError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(id)
            .filter(|doc| !doc.deleted)
            .map(|doc| doc.body.clone()))
    }

    async fn create(&self, document: &Value) -> Result<DocumentRevision, DatabaseError> {
        let id = extract_id(document).unwrap_or_else(|| self.next_id());

        let mut body = document.clone();
        if let Some(obj) = body.as_object_mut() {
            obj.remove("_rev");
            obj.remove("_deleted");
        }

        let mut documents = self.documents.write().await;
        let rev = self.apply_write(&mut documents, &id, &body)?;
        Ok(DocumentRevision { id, rev })
    }

    async fn put(&self, id: &str, document: &Value) -> Result<DocumentRevision, DatabaseError> {
        let mut documents = self.documents.write().await;
        let rev = self.apply_write(&mut documents, id, document)?;
        Ok(DocumentRevision {
            id: id.to_string(),
            rev,
        })
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<DocumentRevision, DatabaseError> {
        let tombstone = json!({ "_id": id, "_rev": rev, "_deleted": true });
        let mut documents = self.documents.write().await;
        let rev = self.apply_write(&mut documents, id, &tombstone)?;
        Ok(DocumentRevision {
            id: id.to_string(),
            rev,
        })
    }

    async fn bulk_docs(&self, documents: &[Value]) -> Result<Vec<BulkItemResult>, DatabaseError> {
        self.counters.bulk.fetch_add(1, Ordering::SeqCst);
        Ok(self.apply_bulk(documents).await)
    }

    async fn query_view(
        &self,
        view: &ViewRef,
        query: &ViewQuery,
    ) -> Result<ViewResult, DatabaseError> {
        self.counters.view.fetch_add(1, Ordering::SeqCst);

        let designs = self.designs.read().await;
        let definition = designs
            .get(&view.design)
            .and_then(|design| design.view(&view.view))
            .ok_or_else(|| DatabaseError::not_found(view.to_string()))?;

        let documents = self.documents.read().await;
        Ok(views::execute(definition, &documents, query))
    }

    async fn ensure_design_document(&self, design: &DesignDocument) -> Result<(), DatabaseError> {
        let mut designs = self.designs.write().await;
        designs.insert(design.name().to_string(), design.clone());
        Ok(())
    }

    async fn find(&self, request: &FindRequest) -> Result<Vec<Value>, DatabaseError> {
        self.counters.find.fetch_add(1, Ordering::SeqCst);

        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|(id, doc)| !doc.deleted && !id.starts_with("_design/"))
            .map(|(_, doc)| &doc.body)
            .filter(|body| request.selector.matches(body))
            .skip(request.skip.unwrap_or(0))
            .take(request.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oidc_docdb::{BuiltinReduce, Selector, ViewDefinition};

    fn design() -> DesignDocument {
        DesignDocument::new("test").with_view(
            ViewDefinition::new("by_kind", "", |doc, out| {
                if let Some(kind) = doc.get("kind").and_then(Value::as_str) {
                    out.emit(kind, doc["_rev"].clone());
                }
            })
            .with_reduce(BuiltinReduce::Count),
        )
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let db = MemoryDatabase::new();

        let created = db.create(&json!({"kind": "app"})).await.unwrap();
        let doc = db.get(&created.id).await.unwrap().unwrap();
        assert_eq!(doc["_rev"], created.rev);

        let mut changed = doc.clone();
        changed["kind"] = json!("scope");
        let updated = db.put(&created.id, &changed).await.unwrap();
        assert!(updated.rev.starts_with("2-"));

        // Stale revision is refused
        let err = db.put(&created.id, &doc).await.unwrap_err();
        assert!(err.is_conflict());

        let err = db.delete(&created.id, &created.rev).await.unwrap_err();
        assert!(err.is_conflict());

        db.delete(&created.id, &updated.rev).await.unwrap();
        assert!(db.get(&created.id).await.unwrap().is_none());

        let err = db.delete(&created.id, &updated.rev).await.unwrap_err();
        assert!(err.is_conflict());

        let err = db.delete("never-written", "1-abc").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_with_existing_id_conflicts() {
        let db = MemoryDatabase::new();
        db.create(&json!({"_id": "fixed"})).await.unwrap();
        let err = db.create(&json!({"_id": "fixed"})).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_query_view_requires_design() {
        let db = MemoryDatabase::new();
        let view = ViewRef::new("test", "by_kind");

        let err = db.query_view(&view, &ViewQuery::new()).await.unwrap_err();
        assert!(err.is_not_found());

        db.ensure_design_document(&design()).await.unwrap();
        db.create(&json!({"kind": "app"})).await.unwrap();
        db.create(&json!({"kind": "app"})).await.unwrap();
        db.create(&json!({"kind": "token"})).await.unwrap();

        let counted = db
            .query_view(&view, &ViewQuery::new().with_key("app"))
            .await
            .unwrap();
        assert_eq!(counted.rows[0].value, json!(2));

        let rows = db
            .query_view(&view, &ViewQuery::new().with_reduce(false).include_docs())
            .await
            .unwrap();
        assert_eq!(rows.rows.len(), 3);
        assert!(rows.rows.iter().all(|row| row.doc.is_some()));
        assert_eq!(db.counters().view(), 3);
    }

    #[tokio::test]
    async fn test_find_with_selector() {
        let db = MemoryDatabase::new();
        db.create(&json!({"_id": "a", "kind": "app", "uris": ["x", "y"]})).await.unwrap();
        db.create(&json!({"_id": "b", "kind": "app", "uris": ["y"]})).await.unwrap();
        db.create(&json!({"_id": "c", "kind": "scope"})).await.unwrap();

        let found = db
            .find(&FindRequest::new(
                Selector::eq("kind", "app").and(Selector::contains("uris", "y")),
            ))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let found = db
            .find(&FindRequest::new(Selector::eq("kind", "app")).with_skip(1).with_limit(5))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["_id"], "b");
    }
}

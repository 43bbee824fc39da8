//! Scope store.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use oidc_docdb::DynDatabase;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::document::DocumentStore;
use crate::catalog::{CatalogHandle, ViewName};
use crate::config::CouchStoreOptions;
use crate::error::{StoreResult, require};
use crate::query::ScopedQuery;
use crate::storage::{EntityStore, EntityStream, ScopeStore};
use crate::types::{Scope, ScopeEntity};

/// Scope store over a document database.
pub struct CouchScopeStore<A = Scope> {
    core: DocumentStore<A>,
}

impl<A> Clone for CouchScopeStore<A> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<A: ScopeEntity> CouchScopeStore<A> {
    pub fn new(db: DynDatabase, options: Arc<CouchStoreOptions>, catalog: CatalogHandle) -> Self {
        Self {
            core: DocumentStore::new(db, options, catalog),
        }
    }

    /// Checks `token` before every database round trip.
    #[must_use]
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self {
            core: self.core.with_cancellation(token),
        }
    }
}

#[async_trait]
impl<A: ScopeEntity> EntityStore for CouchScopeStore<A> {
    type Entity = A;

    #[instrument(skip(self))]
    async fn count(&self) -> StoreResult<u64> {
        self.core.count(ViewName::ScopeCount).await
    }

    #[instrument(skip_all)]
    async fn count_with<F, R>(&self, query: F) -> StoreResult<u64>
    where
        F: FnOnce(ScopedQuery<A>) -> ScopedQuery<A, R> + Send + 'static,
        R: Send + 'static,
    {
        self.core.count_with(query).await
    }

    #[instrument(skip_all)]
    async fn create(&self, scope: &mut A) -> StoreResult<()> {
        self.core.create(scope).await
    }

    #[instrument(skip_all, fields(id = ?scope.id()))]
    async fn delete(&self, scope: &A) -> StoreResult<()> {
        self.core.delete(scope, &[]).await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<A>> {
        self.core.find_by_id(id).await
    }

    fn list(&self, count: Option<usize>, offset: Option<usize>) -> EntityStream<'_, A> {
        self.core.list(ViewName::ScopeAll, count, offset)
    }

    fn list_with<F, S, R>(&self, query: F, state: S) -> EntityStream<'_, R>
    where
        F: FnOnce(ScopedQuery<A>, S) -> ScopedQuery<A, R> + Send + 'static,
        S: Send + 'static,
        R: Send + 'static,
    {
        self.core.list_with(query, state)
    }

    #[instrument(skip_all)]
    async fn get_with<F, S, R>(&self, query: F, state: S) -> StoreResult<Option<R>>
    where
        F: FnOnce(ScopedQuery<A>, S) -> ScopedQuery<A, R> + Send + 'static,
        S: Send + 'static,
        R: Send + 'static,
    {
        self.core.get_with(query, state).await
    }

    fn instantiate(&self) -> StoreResult<A> {
        self.core.instantiate()
    }

    #[instrument(skip_all, fields(id = ?scope.id()))]
    async fn update(&self, scope: &mut A) -> StoreResult<()> {
        self.core.update(scope).await
    }
}

#[async_trait]
impl<A: ScopeEntity> ScopeStore for CouchScopeStore<A> {
    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<A>> {
        require("name", name)?;
        self.core.find_one(ViewName::ScopeName, name).await
    }

    fn find_by_names(&self, names: &[&str]) -> StoreResult<EntityStream<'_, A>> {
        for name in names {
            require("names", name)?;
        }
        if names.is_empty() {
            return Ok(Box::pin(stream::empty()));
        }
        Ok(self.core.stream_by_keys(ViewName::ScopeName, names))
    }

    fn find_by_resource(&self, resource: &str) -> StoreResult<EntityStream<'_, A>> {
        require("resource", resource)?;
        Ok(self.core.stream_by_key(ViewName::ScopeResource, resource))
    }
}

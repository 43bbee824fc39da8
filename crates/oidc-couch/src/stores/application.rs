//! Application store.

use std::sync::Arc;

use async_trait::async_trait;
use oidc_docdb::DynDatabase;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::document::DocumentStore;
use crate::catalog::{CatalogHandle, ViewName};
use crate::config::CouchStoreOptions;
use crate::error::{StoreResult, require};
use crate::query::ScopedQuery;
use crate::storage::{ApplicationStore, EntityStore, EntityStream};
use crate::types::{Application, ApplicationEntity};

/// Application store over a document database.
pub struct CouchApplicationStore<A = Application> {
    core: DocumentStore<A>,
}

impl<A> Clone for CouchApplicationStore<A> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<A: ApplicationEntity> CouchApplicationStore<A> {
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
impl<A: ApplicationEntity> EntityStore for CouchApplicationStore<A> {
    type Entity = A;

    #[instrument(skip(self))]
    async fn count(&self) -> StoreResult<u64> {
        self.core.count(ViewName::ApplicationCount).await
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
    async fn create(&self, application: &mut A) -> StoreResult<()> {
        self.core.create(application).await
    }

    #[instrument(skip_all, fields(id = ?application.id()))]
    async fn delete(&self, application: &A) -> StoreResult<()> {
        self.core
            .delete(
                application,
                &[
                    ViewName::AuthorizationApplicationId,
                    ViewName::TokenApplicationId,
                ],
            )
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<A>> {
        self.core.find_by_id(id).await
    }

    fn list(&self, count: Option<usize>, offset: Option<usize>) -> EntityStream<'_, A> {
        self.core.list(ViewName::ApplicationAll, count, offset)
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

    #[instrument(skip_all, fields(id = ?application.id()))]
    async fn update(&self, application: &mut A) -> StoreResult<()> {
        self.core.update(application).await
    }
}

#[async_trait]
impl<A: ApplicationEntity> ApplicationStore for CouchApplicationStore<A> {
    #[instrument(skip(self))]
    async fn find_by_client_id(&self, client_id: &str) -> StoreResult<Option<A>> {
        require("client_id", client_id)?;
        self.core
            .find_one(ViewName::ApplicationClientId, client_id)
            .await
    }

    fn find_by_post_logout_redirect_uri(&self, uri: &str) -> StoreResult<EntityStream<'_, A>> {
        require("uri", uri)?;
        Ok(self
            .core
            .stream_by_key(ViewName::ApplicationPostLogoutRedirectUri, uri))
    }

    fn find_by_redirect_uri(&self, uri: &str) -> StoreResult<EntityStream<'_, A>> {
        require("uri", uri)?;
        Ok(self.core.stream_by_key(ViewName::ApplicationRedirectUri, uri))
    }
}

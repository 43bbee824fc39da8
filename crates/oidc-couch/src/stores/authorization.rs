//! Authorization store.

use std::sync::Arc;

use async_trait::async_trait;
use oidc_docdb::DynDatabase;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::document::DocumentStore;
use crate::catalog::{CatalogHandle, ViewName};
use crate::config::CouchStoreOptions;
use crate::error::{StoreResult, require};
use crate::query::ScopedQuery;
use crate::storage::{AuthorizationStore, EntityStore, EntityStream};
use crate::types::{Authorization, AuthorizationEntity};

/// Authorization store over a document database.
pub struct CouchAuthorizationStore<A = Authorization> {
    core: DocumentStore<A>,
}

impl<A> Clone for CouchAuthorizationStore<A> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<A: AuthorizationEntity> CouchAuthorizationStore<A> {
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
impl<A: AuthorizationEntity> EntityStore for CouchAuthorizationStore<A> {
    type Entity = A;

    #[instrument(skip(self))]
    async fn count(&self) -> StoreResult<u64> {
        self.core.count(ViewName::AuthorizationCount).await
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
    async fn create(&self, authorization: &mut A) -> StoreResult<()> {
        self.core.create(authorization).await
    }

    #[instrument(skip_all, fields(id = ?authorization.id()))]
    async fn delete(&self, authorization: &A) -> StoreResult<()> {
        self.core
            .delete(authorization, &[ViewName::TokenAuthorizationId])
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<A>> {
        self.core.find_by_id(id).await
    }

    fn list(&self, count: Option<usize>, offset: Option<usize>) -> EntityStream<'_, A> {
        self.core.list(ViewName::AuthorizationAll, count, offset)
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

    #[instrument(skip_all, fields(id = ?authorization.id()))]
    async fn update(&self, authorization: &mut A) -> StoreResult<()> {
        self.core.update(authorization).await
    }
}

#[async_trait]
impl<A: AuthorizationEntity> AuthorizationStore for CouchAuthorizationStore<A> {
    fn find<'a>(
        &'a self,
        subject: &str,
        client: &str,
        status: Option<&str>,
        authorization_type: Option<&str>,
        scopes: Option<&[&str]>,
    ) -> StoreResult<EntityStream<'a, A>> {
        require("subject", subject)?;
        require("client", client)?;

        let mut query = self
            .core
            .scoped()
            .where_eq("subject", subject)
            .where_eq("application_id", client);

        if let Some(status) = status {
            require("status", status)?;
            query = query.where_eq("status", status);
        }
        if let Some(authorization_type) = authorization_type {
            require("type", authorization_type)?;
            query = query.where_eq("type", authorization_type);
        }
        if let Some(scopes) = scopes {
            for scope in scopes {
                require("scopes", scope)?;
            }
            if !scopes.is_empty() {
                query = query.where_contains_all("scopes", scopes.iter().copied());
            }
        }

        Ok(Box::pin(self.core.stream_query(query)))
    }

    fn find_by_application_id(&self, application_id: &str) -> StoreResult<EntityStream<'_, A>> {
        require("application_id", application_id)?;
        Ok(self
            .core
            .stream_by_key(ViewName::AuthorizationApplicationId, application_id))
    }

    fn find_by_subject(&self, subject: &str) -> StoreResult<EntityStream<'_, A>> {
        require("subject", subject)?;
        Ok(self.core.stream_by_key(ViewName::AuthorizationSubject, subject))
    }

    #[instrument(skip(self))]
    async fn prune(&self, threshold: OffsetDateTime) -> StoreResult<u64> {
        self.core.prune(ViewName::AuthorizationPrune, threshold).await
    }
}

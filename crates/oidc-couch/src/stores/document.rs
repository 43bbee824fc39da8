//! Document store core shared by the four entity stores.

use std::marker::PhantomData;
use std::sync::Arc;

use async_stream::try_stream;
use futures_util::Stream;
use futures_util::future::try_join_all;
use oidc_docdb::{DynDatabase, ViewQuery, ViewRef};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bulk::{BulkMutator, Tombstone};
use crate::catalog::{CatalogHandle, ViewName};
use crate::config::CouchStoreOptions;
use crate::conflict::{self, DeleteOutcome};
use crate::dates;
use crate::error::{StoreError, StoreResult, require};
use crate::query::ScopedQuery;
use crate::storage::EntityStream;
use crate::types::EntityDocument;

/// Database handle, options snapshot and catalog handle for one entity type.
pub(crate) struct DocumentStore<A> {
    db: DynDatabase,
    options: Arc<CouchStoreOptions>,
    catalog: CatalogHandle,
    cancellation: Option<CancellationToken>,
    _entity: PhantomData<fn() -> A>,
}

impl<A> Clone for DocumentStore<A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            options: Arc::clone(&self.options),
            catalog: self.catalog.clone(),
            cancellation: self.cancellation.clone(),
            _entity: PhantomData,
        }
    }
}

impl<A: EntityDocument> DocumentStore<A> {
    pub(crate) fn new(
        db: DynDatabase,
        options: Arc<CouchStoreOptions>,
        catalog: CatalogHandle,
    ) -> Self {
        Self {
            db,
            options,
            catalog,
            cancellation: None,
            _entity: PhantomData,
        }
    }

    pub(crate) fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn discriminator(&self) -> &str {
        self.options.discriminators.for_kind(A::KIND)
    }

    fn view(&self, name: ViewName) -> ViewRef {
        self.catalog.snapshot().view(name).clone()
    }

    fn check_cancelled(&self) -> StoreResult<()> {
        check_cancelled(self.cancellation.as_ref())
    }

    /// Fresh query over the documents of this kind.
    pub(crate) fn scoped(&self) -> ScopedQuery<A> {
        ScopedQuery::new(
            Arc::clone(&self.db),
            self.discriminator(),
            self.options.query_limit,
        )
    }

    // ===== Reads =====

    pub(crate) async fn count(&self, name: ViewName) -> StoreResult<u64> {
        self.check_cancelled()?;
        let view = self.view(name);
        let result = self.db.query_view(&view, &ViewQuery::new()).await?;

        let Some(row) = result.rows.first() else {
            return Ok(0);
        };
        match row.value.as_u64() {
            Some(count) => Ok(count),
            None => {
                warn!(view = %view, value = %row.value, "Count view returned a non-numeric value");
                Ok(0)
            }
        }
    }

    pub(crate) async fn count_with<F, R>(&self, query: F) -> StoreResult<u64>
    where
        F: FnOnce(ScopedQuery<A>) -> ScopedQuery<A, R>,
        R: Send + 'static,
    {
        self.check_cancelled()?;
        query(self.scoped()).count().await
    }

    pub(crate) async fn find_by_id(&self, id: &str) -> StoreResult<Option<A>> {
        require("identifier", id)?;
        self.check_cancelled()?;

        let Some(document) = self.db.get(id).await? else {
            return Ok(None);
        };
        if document.get("discriminator").and_then(Value::as_str) != Some(self.discriminator()) {
            debug!(id, kind = %A::KIND, "Document belongs to another kind");
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(document)?))
    }

    /// First entity whose indexed value in `name` equals `key`.
    pub(crate) async fn find_one(&self, name: ViewName, key: &str) -> StoreResult<Option<A>> {
        self.check_cancelled()?;
        let view = self.view(name);
        let query = ViewQuery::new().with_key(key).include_docs().with_limit(1);
        let result = self.db.query_view(&view, &query).await?;
        debug!(view = %view, rows = result.rows.len(), "View queried");

        result
            .rows
            .into_iter()
            .find_map(|row| row.doc)
            .map(serde_json::from_value::<A>)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Entities whose indexed value in `name` equals `key`.
    pub(crate) fn stream_by_key(&self, name: ViewName, key: &str) -> EntityStream<'static, A> {
        let query = ViewQuery::new().with_key(key).include_docs();
        Box::pin(self.paged(name, query, None, 0))
    }

    /// Entities whose indexed value in `name` equals any of `keys`.
    pub(crate) fn stream_by_keys(&self, name: ViewName, keys: &[&str]) -> EntityStream<'static, A> {
        let query = ViewQuery::new().with_keys(keys.iter().copied()).include_docs();
        Box::pin(self.paged(name, query, None, 0))
    }

    pub(crate) fn list(
        &self,
        name: ViewName,
        count: Option<usize>,
        offset: Option<usize>,
    ) -> EntityStream<'static, A> {
        let query = ViewQuery::new().with_reduce(false).include_docs();
        Box::pin(self.paged(name, query, count, offset.unwrap_or(0)))
    }

    pub(crate) fn list_with<F, S, R>(&self, query: F, state: S) -> EntityStream<'static, R>
    where
        F: FnOnce(ScopedQuery<A>, S) -> ScopedQuery<A, R>,
        R: Send + 'static,
    {
        Box::pin(self.stream_query(query(self.scoped(), state)))
    }

    pub(crate) async fn get_with<F, S, R>(&self, query: F, state: S) -> StoreResult<Option<R>>
    where
        F: FnOnce(ScopedQuery<A>, S) -> ScopedQuery<A, R>,
        R: Send + 'static,
    {
        self.check_cancelled()?;
        query(self.scoped(), state).first().await
    }

    /// Runs a scoped query when the stream is first polled.
    pub(crate) fn stream_query<R>(
        &self,
        query: ScopedQuery<A, R>,
    ) -> impl Stream<Item = StoreResult<R>> + Send + use<A, R>
    where
        R: Send + 'static,
    {
        let cancellation = self.cancellation.clone();
        try_stream! {
            check_cancelled(cancellation.as_ref())?;
            for item in query.fetch().await? {
                yield item;
            }
        }
    }

    /// Pages through a view with `include_docs`, one round trip per page.
    fn paged(
        &self,
        name: ViewName,
        base: ViewQuery,
        count: Option<usize>,
        offset: usize,
    ) -> impl Stream<Item = StoreResult<A>> + Send + use<A> {
        let db = Arc::clone(&self.db);
        let view = self.view(name);
        let page_size = self.options.list_page_size;
        let cancellation = self.cancellation.clone();

        try_stream! {
            let mut fetched = 0usize;
            loop {
                let limit = match count {
                    Some(count) if fetched >= count => break,
                    Some(count) => (count - fetched).min(page_size),
                    None => page_size,
                };
                check_cancelled(cancellation.as_ref())?;

                let query = base.clone().with_limit(limit).with_skip(offset + fetched);
                let result = db.query_view(&view, &query).await?;
                let returned = result.rows.len();
                debug!(view = %view, skip = offset + fetched, rows = returned, "View page fetched");

                for row in result.rows {
                    if let Some(document) = row.doc {
                        yield serde_json::from_value::<A>(document)?;
                    }
                }

                fetched += returned;
                if returned < limit {
                    break;
                }
            }
        }
    }

    // ===== Writes =====

    pub(crate) fn instantiate(&self) -> StoreResult<A> {
        A::instantiate().map_err(StoreError::instantiation::<A>)
    }

    pub(crate) async fn create(&self, entity: &mut A) -> StoreResult<()> {
        self.check_cancelled()?;
        {
            let meta = entity.meta_mut();
            meta.discriminator = self.discriminator().to_owned();
            meta.rev = None;
        }

        let body = serde_json::to_value(&*entity)?;
        let revision = self.db.create(&body).await?;
        debug!(kind = %A::KIND, id = %revision.id, "Entity created");

        let meta = entity.meta_mut();
        meta.id = Some(revision.id);
        meta.rev = Some(revision.rev);
        Ok(())
    }

    pub(crate) async fn update(&self, entity: &mut A) -> StoreResult<()> {
        let (id, _) = persisted_identity(entity)?;
        self.check_cancelled()?;
        entity.meta_mut().discriminator = self.discriminator().to_owned();

        let body = serde_json::to_value(&*entity)?;
        let revision = conflict::on_update(A::KIND, &id, self.db.put(&id, &body).await)?;
        debug!(kind = %A::KIND, id = %id, rev = %revision.rev, "Entity updated");

        entity.meta_mut().rev = Some(revision.rev);
        Ok(())
    }

    /// Deletes the entity, then removes children indexed by its ID in
    /// `children`.
    pub(crate) async fn delete(&self, entity: &A, children: &[ViewName]) -> StoreResult<()> {
        let (id, rev) = persisted_identity(entity)?;
        self.check_cancelled()?;

        let mut outcome = conflict::on_delete(A::KIND, &id, self.db.delete(&id, &rev).await);
        // CouchDB answers a delete of a tombstone with a conflict; a read
        // tells that apart from a live document at a newer revision.
        if outcome.as_ref().is_err_and(StoreError::is_concurrency)
            && self.db.get(&id).await?.is_none()
        {
            outcome = Ok(DeleteOutcome::AlreadyGone);
        }

        match outcome? {
            DeleteOutcome::Deleted(_) => debug!(kind = %A::KIND, id = %id, "Entity deleted"),
            DeleteOutcome::AlreadyGone => {
                debug!(kind = %A::KIND, id = %id, "Entity already deleted");
            }
        }

        if children.is_empty() {
            return Ok(());
        }
        self.cascade(&id, children)
            .await
            .map_err(|err| StoreError::cascade(A::KIND, id.clone(), err))
    }

    async fn cascade(&self, id: &str, children: &[ViewName]) -> StoreResult<()> {
        self.check_cancelled()?;
        let lookups = children.iter().map(|name| {
            let view = self.view(*name);
            let db = Arc::clone(&self.db);
            async move {
                let result = db.query_view(&view, &ViewQuery::new().with_key(id)).await?;
                Ok::<_, StoreError>(result.rows)
            }
        });

        let tombstones: Vec<Tombstone> = try_join_all(lookups)
            .await?
            .iter()
            .flatten()
            .filter_map(Tombstone::from_row)
            .collect();

        let removed = BulkMutator::new(Arc::clone(&self.db), self.options.bulk_batch_size)
            .submit_tombstones(&tombstones)
            .await?;
        info!(kind = %A::KIND, id, removed, "Cascade delete completed");
        Ok(())
    }

    /// Walks the prune view downwards from `[threshold, now]` and removes
    /// every row, one batch at a time.
    pub(crate) async fn prune(&self, name: ViewName, threshold: OffsetDateTime) -> StoreResult<u64> {
        let start_key = json!([format_date(threshold)?, format_date(OffsetDateTime::now_utc())?]);
        let view = self.view(name);
        let batch_size = self.options.prune_batch_size;
        let mutator = BulkMutator::new(Arc::clone(&self.db), batch_size);

        let mut removed = 0u64;
        loop {
            self.check_cancelled()?;
            let query = ViewQuery::new()
                .with_start_key(start_key.clone())
                .descending()
                .with_limit(batch_size);
            let result = self.db.query_view(&view, &query).await?;
            let returned = result.rows.len();

            let tombstones: Vec<Tombstone> =
                result.rows.iter().filter_map(Tombstone::from_row).collect();
            removed += mutator.submit_tombstones(&tombstones).await? as u64;

            if returned < batch_size {
                break;
            }
        }

        info!(kind = %A::KIND, view = %view, removed, "Prune completed");
        Ok(removed)
    }
}

fn check_cancelled(token: Option<&CancellationToken>) -> StoreResult<()> {
    match token {
        Some(token) if token.is_cancelled() => Err(StoreError::Cancelled),
        _ => Ok(()),
    }
}

fn persisted_identity<A: EntityDocument>(entity: &A) -> StoreResult<(String, String)> {
    let id = entity
        .id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::invalid_argument("entity", "the entity has no identifier"))?;
    let rev = entity
        .revision()
        .filter(|rev| !rev.is_empty())
        .ok_or_else(|| StoreError::invalid_argument("entity", "the entity has no revision"))?;
    Ok((id.to_owned(), rev.to_owned()))
}

fn format_date(value: OffsetDateTime) -> StoreResult<String> {
    dates::format(value).map_err(|err| StoreError::invalid_argument("threshold", err.to_string()))
}

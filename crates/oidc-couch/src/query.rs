//! Discriminator-scoped ad-hoc queries.
//!
//! A [`ScopedQuery`] always selects one entity kind and never returns more
//! than the configured ceiling. Typed selectors are pushed down to the
//! database; closures added with [`ScopedQuery::filter`] run in process on
//! the decoded entities.

use std::fmt;
use std::sync::Arc;

use oidc_docdb::{DynDatabase, FindRequest, Selector};
use serde_json::Value;
use tracing::debug;

use crate::error::StoreResult;
use crate::types::EntityDocument;

type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type Projection<T, R> = Arc<dyn Fn(T) -> R + Send + Sync>;

/// A bounded query over the documents of one entity kind.
///
/// `T` is the stored entity type and `R` the result of the projection
/// applied by [`ScopedQuery::map`].
pub struct ScopedQuery<T, R = T> {
    db: DynDatabase,
    discriminator: String,
    ceiling: usize,
    take: Option<usize>,
    skip: usize,
    selectors: Vec<Selector>,
    filters: Vec<Filter<T>>,
    projection: Projection<T, R>,
}

impl<T: EntityDocument> ScopedQuery<T, T> {
    pub(crate) fn new(db: DynDatabase, discriminator: impl Into<String>, ceiling: usize) -> Self {
        Self {
            db,
            discriminator: discriminator.into(),
            ceiling,
            take: None,
            skip: 0,
            selectors: Vec::new(),
            filters: Vec::new(),
            projection: Arc::new(|entity: T| entity),
        }
    }
}

impl<T, R> ScopedQuery<T, R>
where
    T: EntityDocument,
    R: Send + 'static,
{
    // ===== Composition =====

    /// Keeps documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.selectors.push(Selector::eq(field, value));
        self
    }

    /// Keeps documents whose array `field` contains `value`.
    #[must_use]
    pub fn where_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.selectors.push(Selector::contains(field, value));
        self
    }

    /// Keeps documents whose array `field` contains every one of `values`.
    #[must_use]
    pub fn where_contains_all<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.selectors.push(Selector::contains_all(field, values));
        self
    }

    /// Keeps entities accepted by `predicate`, evaluated in process.
    #[must_use]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(predicate));
        self
    }

    /// Returns at most `count` results. Never raises the ceiling.
    #[must_use]
    pub fn take(mut self, count: usize) -> Self {
        self.take = Some(self.take.map_or(count, |current| current.min(count)));
        self
    }

    /// Skips the first `count` matches.
    #[must_use]
    pub fn skip(mut self, count: usize) -> Self {
        self.skip = self.skip.saturating_add(count);
        self
    }

    /// Projects every result through `f`.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> ScopedQuery<T, U>
    where
        F: Fn(R) -> U + Send + Sync + 'static,
        U: Send + 'static,
    {
        let previous = self.projection;
        ScopedQuery {
            db: self.db,
            discriminator: self.discriminator,
            ceiling: self.ceiling,
            take: self.take,
            skip: self.skip,
            selectors: self.selectors,
            filters: self.filters,
            projection: Arc::new(move |entity: T| f(previous(entity))),
        }
    }

    /// Maximum number of results the query can return.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.take.map_or(self.ceiling, |take| take.min(self.ceiling))
    }

    // ===== Execution =====

    /// Runs the query and returns every result.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a document cannot be
    /// decoded.
    pub async fn fetch(self) -> StoreResult<Vec<R>> {
        let projection = Arc::clone(&self.projection);
        let entities = self.execute().await?;
        Ok(entities.into_iter().map(|entity| projection(entity)).collect())
    }

    /// Runs the query and returns the first result.
    ///
    /// # Errors
    ///
    /// Same as [`ScopedQuery::fetch`].
    pub async fn first(self) -> StoreResult<Option<R>> {
        Ok(self.take(1).fetch().await?.into_iter().next())
    }

    /// Counts the matching documents, up to the query limit.
    ///
    /// # Errors
    ///
    /// Same as [`ScopedQuery::fetch`].
    pub async fn count(self) -> StoreResult<u64> {
        Ok(self.execute().await?.len() as u64)
    }

    fn selector(&self) -> Selector {
        self.selectors
            .iter()
            .cloned()
            .fold(Selector::eq("discriminator", self.discriminator.as_str()), Selector::and)
    }

    async fn execute(&self) -> StoreResult<Vec<T>> {
        let limit = self.limit();
        if limit == 0 {
            return Ok(Vec::new());
        }

        let selector = self.selector();

        // Closures cannot be pushed down, so paging happens after filtering.
        let request = if self.filters.is_empty() {
            FindRequest::new(selector)
                .with_limit(limit)
                .with_skip(self.skip)
        } else {
            FindRequest::new(selector).with_limit(self.ceiling)
        };

        let documents = self.db.find(&request).await?;
        debug!(
            discriminator = %self.discriminator,
            rows = documents.len(),
            "Scoped query executed"
        );

        let mut entities = documents
            .into_iter()
            .map(serde_json::from_value::<T>)
            .collect::<Result<Vec<_>, _>>()?;

        if !self.filters.is_empty() {
            entities = entities
                .into_iter()
                .filter(|entity| self.filters.iter().all(|filter| filter(entity)))
                .skip(self.skip)
                .take(limit)
                .collect();
        }

        Ok(entities)
    }
}

impl<T, R> fmt::Debug for ScopedQuery<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedQuery")
            .field("discriminator", &self.discriminator)
            .field("ceiling", &self.ceiling)
            .field("take", &self.take)
            .field("skip", &self.skip)
            .field("selectors", &self.selectors)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Token;
    use oidc_docdb::DocumentDatabase;
    use oidc_docdb_memory::MemoryDatabase;
    use serde_json::json;

    async fn seeded() -> DynDatabase {
        let db = MemoryDatabase::new();
        for (id, discriminator, subject) in [
            ("t1", "token", "alice"),
            ("t2", "token", "bob"),
            ("t3", "token", "alice"),
            ("t4", "other", "alice"),
            ("t5", "token", "alice"),
        ] {
            db.create(&json!({
                "_id": id,
                "discriminator": discriminator,
                "subject": subject,
                "scopes": ["openid"]
            }))
            .await
            .unwrap();
        }
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_scoped_to_discriminator() {
        let db = seeded().await;
        let subjects = ScopedQuery::<Token>::new(db, "token", 100)
            .where_eq("subject", "alice")
            .map(|token| token.id().map(str::to_owned))
            .fetch()
            .await
            .unwrap();
        assert_eq!(
            subjects,
            vec![Some("t1".into()), Some("t3".into()), Some("t5".into())]
        );
    }

    #[tokio::test]
    async fn test_ceiling_caps_take() {
        let db = seeded().await;
        let query = ScopedQuery::<Token>::new(db, "token", 2).take(10);
        assert_eq!(query.limit(), 2);
        assert_eq!(query.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_filters_page_after_matching() {
        let db = seeded().await;
        let ids = ScopedQuery::<Token>::new(db, "token", 100)
            .filter(|token| token.subject() == Some("alice"))
            .skip(1)
            .take(1)
            .map(|token| token.id().unwrap_or_default().to_owned())
            .fetch()
            .await
            .unwrap();
        assert_eq!(ids, vec!["t3".to_owned()]);
    }

    #[tokio::test]
    async fn test_first_and_contains() {
        let db = seeded().await;
        let first = ScopedQuery::<Token>::new(Arc::clone(&db), "token", 100)
            .where_contains("scopes", "openid")
            .where_eq("subject", "bob")
            .first()
            .await
            .unwrap();
        assert_eq!(first.unwrap().id(), Some("t2"));

        let none = ScopedQuery::<Token>::new(db, "token", 100)
            .where_contains_all("scopes", ["openid", "email"])
            .first()
            .await
            .unwrap();
        assert!(none.is_none());
    }
}

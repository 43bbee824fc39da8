//! Store traits.
//!
//! [`EntityStore`] carries the operations every kind shares. The
//! kind-specific traits add their lookups on top of it. Each trait is
//! implemented once in [`crate::stores`], generic over the entity type.
//!
//! Lookups returning several entities hand back an [`EntityStream`]. Their
//! arguments are validated before the stream is created; documents are only
//! fetched while the stream is polled.

mod application;
mod authorization;
mod scope;
mod token;

pub use application::ApplicationStore;
pub use authorization::AuthorizationStore;
pub use scope::ScopeStore;
pub use token::TokenStore;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::StoreResult;
use crate::query::ScopedQuery;
use crate::types::EntityDocument;

/// Lazily fetched sequence of entities.
pub type EntityStream<'a, T> = BoxStream<'a, StoreResult<T>>;

// =============================================================================
// Shared Entity Store Trait
// =============================================================================

/// Operations shared by the four entity stores.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Entity type handled by the store.
    type Entity: EntityDocument;

    /// Number of stored entities, read from the reduced count view.
    ///
    /// Returns `0` when the view yields no row or an unparsable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the view query fails.
    async fn count(&self) -> StoreResult<u64>;

    /// Number of entities matched by a caller-composed query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn count_with<F, R>(&self, query: F) -> StoreResult<u64>
    where
        F: FnOnce(ScopedQuery<Self::Entity>) -> ScopedQuery<Self::Entity, R> + Send + 'static,
        R: Send + 'static;

    /// Persists a new entity and writes its ID and revision back.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn create(&self, entity: &mut Self::Entity) -> StoreResult<()>;

    /// Removes an entity at its known revision.
    ///
    /// # Errors
    ///
    /// Returns `Concurrency` if the entity changed since it was read,
    /// `InvalidArgument` if it was never persisted.
    async fn delete(&self, entity: &Self::Entity) -> StoreResult<()>;

    /// Fetches an entity by document ID.
    ///
    /// Documents of another kind are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty ID, or an error if the read fails.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Self::Entity>>;

    /// Streams entities in primary index order.
    ///
    /// `count` bounds the number of entities and `offset` skips leading ones.
    fn list(&self, count: Option<usize>, offset: Option<usize>) -> EntityStream<'_, Self::Entity>;

    /// Streams the results of a caller-composed query.
    fn list_with<F, S, R>(&self, query: F, state: S) -> EntityStream<'_, R>
    where
        F: FnOnce(ScopedQuery<Self::Entity>, S) -> ScopedQuery<Self::Entity, R> + Send + 'static,
        S: Send + 'static,
        R: Send + 'static;

    /// First result of a caller-composed query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn get_with<F, S, R>(&self, query: F, state: S) -> StoreResult<Option<R>>
    where
        F: FnOnce(ScopedQuery<Self::Entity>, S) -> ScopedQuery<Self::Entity, R> + Send + 'static,
        S: Send + 'static,
        R: Send + 'static;

    /// Creates a blank entity of the store's type.
    ///
    /// # Errors
    ///
    /// Returns `Instantiation` if the type cannot be constructed.
    fn instantiate(&self) -> StoreResult<Self::Entity>;

    /// Persists changes at the entity's known revision and records the new one.
    ///
    /// # Errors
    ///
    /// Returns `Concurrency` if the entity was modified or deleted since it was read.
    async fn update(&self, entity: &mut Self::Entity) -> StoreResult<()>;
}

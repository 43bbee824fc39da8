//! Scope storage trait.

use async_trait::async_trait;

use super::{EntityStore, EntityStream};
use crate::error::StoreResult;
use crate::types::ScopeEntity;

/// Storage operations for scopes.
#[async_trait]
pub trait ScopeStore: EntityStore<Entity: ScopeEntity> {
    /// Find a scope by its unique name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Self::Entity>>;

    /// Scopes matching any of `names`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any name is empty.
    fn find_by_names(&self, names: &[&str]) -> StoreResult<EntityStream<'_, Self::Entity>>;

    /// Scopes granting access to `resource`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty resource.
    fn find_by_resource(&self, resource: &str) -> StoreResult<EntityStream<'_, Self::Entity>>;
}

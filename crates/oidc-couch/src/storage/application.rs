//! Application storage trait.

use async_trait::async_trait;

use super::{EntityStore, EntityStream};
use crate::error::StoreResult;
use crate::types::ApplicationEntity;

/// Storage operations for client applications.
///
/// Deleting an application also removes the authorizations and tokens
/// that reference it.
///
/// # Example
///
/// ```ignore
/// use oidc_couch::storage::ApplicationStore;
///
/// async fn example(store: &impl ApplicationStore) -> oidc_couch::StoreResult<()> {
///     if let Some(app) = store.find_by_client_id("my-app").await? {
///         store.delete(&app).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ApplicationStore: EntityStore<Entity: ApplicationEntity> {
    /// Find the application registered under `client_id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty client ID, or an error if the
    /// view query fails.
    async fn find_by_client_id(&self, client_id: &str) -> StoreResult<Option<Self::Entity>>;

    /// Applications allowing `uri` as a post-logout redirect.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty URI.
    fn find_by_post_logout_redirect_uri(
        &self,
        uri: &str,
    ) -> StoreResult<EntityStream<'_, Self::Entity>>;

    /// Applications allowing `uri` as a redirect.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty URI.
    fn find_by_redirect_uri(&self, uri: &str) -> StoreResult<EntityStream<'_, Self::Entity>>;
}

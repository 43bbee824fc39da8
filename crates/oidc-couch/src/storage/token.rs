//! Token storage trait.

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{EntityStore, EntityStream};
use crate::error::StoreResult;
use crate::types::TokenEntity;

/// Storage operations for tokens.
#[async_trait]
pub trait TokenStore: EntityStore<Entity: TokenEntity> {
    /// Tokens issued to `subject` for `client`, optionally narrowed by
    /// status and type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `subject`, `client` or a provided filter
    /// is empty.
    fn find<'a>(
        &'a self,
        subject: &str,
        client: &str,
        status: Option<&str>,
        token_type: Option<&str>,
    ) -> StoreResult<EntityStream<'a, Self::Entity>>;

    /// Tokens referencing an application.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty ID.
    fn find_by_application_id(
        &self,
        application_id: &str,
    ) -> StoreResult<EntityStream<'_, Self::Entity>>;

    /// Tokens issued under an authorization.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty ID.
    fn find_by_authorization_id(
        &self,
        authorization_id: &str,
    ) -> StoreResult<EntityStream<'_, Self::Entity>>;

    /// Find the token with the given reference ID.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty ID.
    async fn find_by_reference_id(&self, reference_id: &str) -> StoreResult<Option<Self::Entity>>;

    /// Tokens issued to a subject.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty subject.
    fn find_by_subject(&self, subject: &str) -> StoreResult<EntityStream<'_, Self::Entity>>;

    /// Removes prunable tokens created before `threshold` and returns how
    /// many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a view query or a bulk batch fails. Batches
    /// committed before the failure stay removed.
    async fn prune(&self, threshold: OffsetDateTime) -> StoreResult<u64>;
}

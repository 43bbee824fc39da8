//! Authorization storage trait.

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{EntityStore, EntityStream};
use crate::error::StoreResult;
use crate::types::AuthorizationEntity;

/// Storage operations for authorizations.
///
/// Deleting an authorization also removes its tokens.
#[async_trait]
pub trait AuthorizationStore: EntityStore<Entity: AuthorizationEntity> {
    /// Authorizations granted to `subject` for `client`, optionally narrowed
    /// by status, type and a set of scopes that must all be present.
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
        authorization_type: Option<&str>,
        scopes: Option<&[&str]>,
    ) -> StoreResult<EntityStream<'a, Self::Entity>>;

    /// Authorizations referencing an application.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty ID.
    fn find_by_application_id(
        &self,
        application_id: &str,
    ) -> StoreResult<EntityStream<'_, Self::Entity>>;

    /// Authorizations granted to a subject.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty subject.
    fn find_by_subject(&self, subject: &str) -> StoreResult<EntityStream<'_, Self::Entity>>;

    /// Removes prunable authorizations created before `threshold` and returns
    /// how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a view query or a bulk batch fails. Batches
    /// committed before the failure stay removed.
    async fn prune(&self, threshold: OffsetDateTime) -> StoreResult<u64>;
}

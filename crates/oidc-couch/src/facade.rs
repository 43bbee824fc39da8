//! Storage facade wiring the four stores to one database.

use std::fmt;
use std::sync::Arc;

use oidc_docdb::DynDatabase;
use tracing::info;

use crate::catalog::CatalogHandle;
use crate::config::{ConfigError, CouchStoreOptions, ViewOptions};
use crate::design::build_design_document;
use crate::error::StoreResult;
use crate::stores::{
    CouchApplicationStore, CouchAuthorizationStore, CouchScopeStore, CouchTokenStore,
};
use crate::types::{
    Application, ApplicationEntity, Authorization, AuthorizationEntity, Scope, ScopeEntity, Token,
    TokenEntity,
};

/// Owns the database handle, the options snapshot and the view catalog, and
/// hands out stores sharing them.
#[derive(Clone)]
pub struct CouchOidcStorage {
    db: DynDatabase,
    options: Arc<CouchStoreOptions>,
    catalog: CatalogHandle,
}

impl CouchOidcStorage {
    /// Creates the facade after validating `options`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the options are invalid.
    pub fn new(db: DynDatabase, options: CouchStoreOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let catalog = CatalogHandle::new(&options.views);
        Ok(Self {
            db,
            options: Arc::new(options),
            catalog,
        })
    }

    /// Installs the design document for the current view names.
    ///
    /// # Errors
    ///
    /// Returns an error if the design document cannot be written.
    pub async fn initialize(&self) -> StoreResult<()> {
        let views = self.catalog.snapshot();
        self.install(views.options()).await
    }

    /// Switches every store to new view names.
    ///
    /// The design document for `views` is installed first; the catalog is
    /// swapped only once the views exist.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid names, or a database error
    /// if the design document cannot be written. The previous catalog stays
    /// active on error.
    pub async fn reconfigure_views(&self, views: ViewOptions) -> StoreResult<()> {
        views.validate()?;
        self.install(&views).await?;
        self.catalog.apply_options(&views);
        Ok(())
    }

    async fn install(&self, views: &ViewOptions) -> StoreResult<()> {
        let design = build_design_document(views, &self.options.discriminators);
        self.db.ensure_design_document(&design).await?;
        info!(
            design = %design.id(),
            views = design.views().len(),
            backend = self.db.backend_name(),
            "Design document installed"
        );
        Ok(())
    }

    // ===== Stores =====

    pub fn applications(&self) -> CouchApplicationStore {
        self.applications_of::<Application>()
    }

    pub fn authorizations(&self) -> CouchAuthorizationStore {
        self.authorizations_of::<Authorization>()
    }

    pub fn scopes(&self) -> CouchScopeStore {
        self.scopes_of::<Scope>()
    }

    pub fn tokens(&self) -> CouchTokenStore {
        self.tokens_of::<Token>()
    }

    /// Application store for a custom entity type.
    pub fn applications_of<A: ApplicationEntity>(&self) -> CouchApplicationStore<A> {
        CouchApplicationStore::new(self.db.clone(), self.options.clone(), self.catalog.clone())
    }

    /// Authorization store for a custom entity type.
    pub fn authorizations_of<A: AuthorizationEntity>(&self) -> CouchAuthorizationStore<A> {
        CouchAuthorizationStore::new(self.db.clone(), self.options.clone(), self.catalog.clone())
    }

    /// Scope store for a custom entity type.
    pub fn scopes_of<A: ScopeEntity>(&self) -> CouchScopeStore<A> {
        CouchScopeStore::new(self.db.clone(), self.options.clone(), self.catalog.clone())
    }

    /// Token store for a custom entity type.
    pub fn tokens_of<A: TokenEntity>(&self) -> CouchTokenStore<A> {
        CouchTokenStore::new(self.db.clone(), self.options.clone(), self.catalog.clone())
    }

    // ===== Accessors =====

    pub fn options(&self) -> &CouchStoreOptions {
        &self.options
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub fn database(&self) -> &DynDatabase {
        &self.db
    }
}

impl fmt::Debug for CouchOidcStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouchOidcStorage")
            .field("backend", &self.db.backend_name())
            .field("database", &self.options.database_name)
            .finish_non_exhaustive()
    }
}

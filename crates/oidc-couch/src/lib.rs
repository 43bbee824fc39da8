//! # oidc-couch
//!
//! OAuth 2.0 / OpenID Connect entity stores over a document database.
//!
//! Applications, authorizations, scopes and tokens share one database and
//! are told apart by a `discriminator` field. Secondary lookups go through
//! map/reduce views described by a generated design document; ad-hoc
//! predicates go through discriminator-scoped queries.
//!
//! ## Modules
//!
//! - [`config`] - Store options, discriminators and view names
//! - [`types`] - Entity types and the traits custom entities implement
//! - [`storage`] - Store traits
//! - [`stores`] - Store implementations
//! - [`catalog`] - Hot-swappable view catalog
//! - [`query`] - Discriminator-scoped queries
//! - [`bulk`] - Batched tombstone writes
//! - [`design`] - Design document builder
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use oidc_couch::prelude::*;
//! use oidc_docdb_memory::MemoryDatabase;
//!
//! let storage = CouchOidcStorage::new(Arc::new(MemoryDatabase::new()), CouchStoreOptions::default())?;
//! storage.initialize().await?;
//!
//! let applications = storage.applications();
//! let mut app = applications.instantiate()?;
//! app.set_client_id(Some("my-app".into()));
//! applications.create(&mut app).await?;
//! ```

pub mod bulk;
pub mod catalog;
pub mod config;
mod conflict;
pub mod dates;
pub mod design;
pub mod error;
mod facade;
pub mod kind;
pub mod query;
pub mod storage;
pub mod stores;
pub mod types;

pub use catalog::{CatalogHandle, ViewCatalog, ViewName};
pub use config::{ConfigError, CouchStoreOptions, Discriminators, MAX_QUERY_LIMIT, ViewOptions};
pub use error::{ErrorCategory, StoreError, StoreResult};
pub use facade::CouchOidcStorage;
pub use kind::EntityKind;
pub use query::ScopedQuery;
pub use storage::{
    ApplicationStore, AuthorizationStore, EntityStore, EntityStream, ScopeStore, TokenStore,
};
pub use stores::{CouchApplicationStore, CouchAuthorizationStore, CouchScopeStore, CouchTokenStore};
pub use types::{
    Application, ApplicationEntity, Authorization, AuthorizationEntity, DocumentMeta,
    EntityDocument, Scope, ScopeEntity, Token, TokenEntity,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Application, ApplicationStore, Authorization, AuthorizationStore, CouchOidcStorage,
        CouchStoreOptions, EntityDocument, EntityStore, Scope, ScopeStore, StoreError, StoreResult,
        Token, TokenStore,
    };
}

//! # oidc-docdb
//!
//! Document database abstraction layer for the OIDC entity stores.
//!
//! This crate defines the backend trait and the request/response types that
//! every document database implementation speaks. It does not contain any
//! implementations; those live in `oidc-docdb-memory` and `oidc-docdb-http`.
//!
//! ## Overview
//!
//! The main trait is [`DocumentDatabase`], which defines the contract for:
//! - document reads and revisioned writes
//! - bulk writes with per-element outcomes
//! - map/reduce views described by a [`DesignDocument`]
//! - ad-hoc [`Selector`] queries
//!
//! ## Example
//!
//! ```ignore
//! use oidc_docdb::{DocumentDatabase, ViewQuery, ViewRef};
//!
//! async fn subjects(db: &dyn DocumentDatabase, subject: &str) -> oidc_docdb::DatabaseResult<usize> {
//!     let view = ViewRef::new("openiddict", "token.subject");
//!     let rows = db.query_view(&view, &ViewQuery::new().with_key(subject)).await?;
//!     Ok(rows.rows.len())
//! }
//! ```

mod collate;
mod design;
mod error;
mod selector;
mod traits;
mod types;

pub use collate::collate;
pub use design::{BuiltinReduce, DesignDocument, Emitter, MapFn, ViewDefinition};
pub use error::{BulkItemFailure, DatabaseError, ErrorCategory};
pub use selector::Selector;
pub use traits::DocumentDatabase;
pub use types::{
    BulkItemResult, DocumentRevision, FindRequest, ViewQuery, ViewRef, ViewResult, ViewRow,
};

/// Type alias for a database result.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Type alias for a shared database trait object.
pub type DynDatabase = std::sync::Arc<dyn DocumentDatabase>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        DatabaseError, DatabaseResult, DocumentDatabase, DynDatabase, Selector, ViewQuery,
        ViewRef,
    };
}

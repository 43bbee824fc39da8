//! In-memory document database backend for the OIDC entity stores.
//!
//! This crate provides an in-memory implementation of the `DocumentDatabase`
//! trait from `oidc-docdb`. It keeps CouchDB's revision and tombstone rules
//! and evaluates views natively, which makes it the backend of choice for
//! tests and single-process deployments.
//!
//! # Example
//!
//! ```ignore
//! use oidc_docdb::DocumentDatabase;
//! use oidc_docdb_memory::MemoryDatabase;
//!
//! let db = MemoryDatabase::new();
//! let written = db.create(&serde_json::json!({"discriminator": "openiddict.scope"})).await?;
//! ```

mod database_impl;
mod storage;
mod views;

pub use oidc_docdb::{DatabaseError, DocumentDatabase};
pub use storage::{MemoryDatabase, RequestCounters};

/// Creates a new shareable in-memory database.
pub fn create_memory_database() -> oidc_docdb::DynDatabase {
    std::sync::Arc::new(MemoryDatabase::new())
}

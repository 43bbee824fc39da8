//! CouchDB HTTP backend for the OIDC document stores.
//!
//! [`HttpDatabase`] implements `oidc_docdb::DocumentDatabase` over the
//! CouchDB REST API using `reqwest`. HTTP status codes are mapped onto
//! `DatabaseError` variants:
//!
//! - `409` becomes `Conflict`
//! - `404` becomes `NotFound` (and `None` on reads)
//! - `400` with `no_usable_index` becomes `NoUsableIndex`
//! - anything else keeps its status, error code and reason
//!
//! # Example
//!
//! ```ignore
//! use oidc_docdb_http::{HttpDatabase, HttpDatabaseConfig};
//!
//! let config = HttpDatabaseConfig::new("http://localhost:5984/")
//!     .with_credentials("admin", "secret")
//!     .with_create_database(true);
//! let db = HttpDatabase::connect(&config, "openiddict").await?;
//! ```

mod client;
mod config;
mod error;

pub use client::HttpDatabase;
pub use config::{HttpConfigError, HttpDatabaseConfig};
